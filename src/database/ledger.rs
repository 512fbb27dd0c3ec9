//! Assignment ledger: append-only status history per asset.
//!
//! An asset is assigned while a live (`archived_at IS NULL`) row with status
//! `assigned` exists. Retrieval archives that row; nothing is ever deleted.

use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{AssetStatusEntry, AssetTimelineEntry, UserTimelineEntry};
use crate::types::AssetStatusKind;

const ENTRY_COLUMNS: &str = "id, asset_id, status, assigned_to_user, sent_to_service, created_at, archived_at";

pub struct LedgerRepo;

impl LedgerRepo {
    /// Append a status row that is not tied to a user
    pub async fn record_status(
        conn: &mut PgConnection,
        asset_id: Uuid,
        status: AssetStatusKind,
    ) -> Result<AssetStatusEntry, DatabaseError> {
        let query = format!(
            "INSERT INTO asset_status (asset_id, status) VALUES ($1, $2) RETURNING {ENTRY_COLUMNS}"
        );
        let entry = sqlx::query_as::<_, AssetStatusEntry>(&query)
            .bind(asset_id)
            .bind(status)
            .fetch_one(&mut *conn)
            .await?;
        Ok(entry)
    }

    /// True iff no live `assigned` row exists for the asset
    pub async fn is_asset_available<'e, E>(executor: E, asset_id: Uuid) -> Result<bool, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let assigned: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM asset_status
                WHERE asset_id = $1 AND status = 'assigned' AND archived_at IS NULL
            )",
        )
        .bind(asset_id)
        .fetch_one(executor)
        .await?;
        Ok(!assigned)
    }

    /// Append a live `assigned` row. The partial unique index rejects a
    /// second one for the same asset with a `Conflict`.
    pub async fn insert_assignment(
        conn: &mut PgConnection,
        asset_id: Uuid,
        user_id: Uuid,
    ) -> Result<AssetStatusEntry, DatabaseError> {
        let query = format!(
            "INSERT INTO asset_status (asset_id, status, assigned_to_user)
             VALUES ($1, 'assigned', $2)
             RETURNING {ENTRY_COLUMNS}"
        );
        let entry = sqlx::query_as::<_, AssetStatusEntry>(&query)
            .bind(asset_id)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(entry)
    }

    pub async fn active_assignment_id(conn: &mut PgConnection, asset_id: Uuid) -> Result<Option<Uuid>, DatabaseError> {
        let id = sqlx::query_scalar(
            "SELECT id FROM asset_status
             WHERE asset_id = $1 AND status = 'assigned' AND archived_at IS NULL",
        )
        .bind(asset_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(id)
    }

    /// Stamp `archived_at` on a live ledger row
    pub async fn archive_entry(conn: &mut PgConnection, entry_id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE asset_status SET archived_at = now() WHERE id = $1 AND archived_at IS NULL")
            .bind(entry_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Full history of one asset, oldest first, archived rows included
    pub async fn timeline<'e, E>(executor: E, asset_id: Uuid) -> Result<Vec<AssetTimelineEntry>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, AssetTimelineEntry>(
            "SELECT s.id, s.status, s.assigned_to_user, u.name AS assigned_to_name,
                s.sent_to_service, s.created_at, s.archived_at
             FROM asset_status s
             LEFT JOIN users u ON u.id = s.assigned_to_user
             WHERE s.asset_id = $1
             ORDER BY s.created_at ASC, s.id ASC",
        )
        .bind(asset_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Every ledger row that ever assigned an asset to the user, oldest first
    pub async fn user_timeline<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<UserTimelineEntry>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, UserTimelineEntry>(
            "SELECT s.id, s.asset_id, a.serial_no, m.asset_type, b.name AS brand, m.name AS model,
                s.status, s.created_at AS assigned_at, s.archived_at AS returned_at
             FROM asset_status s
             JOIN assets a ON a.id = s.asset_id
             JOIN asset_models m ON m.id = a.model_id
             JOIN asset_brands b ON b.id = m.brand_id
             WHERE s.assigned_to_user = $1
             ORDER BY s.created_at ASC, s.id ASC",
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Number of live ledger rows assigning an asset to the user
    pub async fn count_active_assignments<'e, E>(executor: E, user_id: Uuid) -> Result<i64, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM asset_status
             WHERE assigned_to_user = $1 AND status = 'assigned' AND archived_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }
}
