//! Asset rows and their joined read projections.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{AssetListFilter, AssetPatch, AssetSummary, AssetWithModel, NewAsset};
use super::query_builder::QueryBuilder;
use crate::filter::{Filter, FilterOrder, Page, SqlParam};

/// Latest live ledger row per asset; no row means the asset is available
macro_rules! current_status_join {
    () => {
        "LEFT JOIN LATERAL (
            SELECT s.status, s.assigned_to_user
            FROM asset_status s
            WHERE s.asset_id = a.id AND s.archived_at IS NULL
            ORDER BY s.created_at DESC
            LIMIT 1
        ) cs ON true"
    };
}

const SEARCH_COLUMNS: &[&str] = &["b.name", "m.name", "a.serial_no"];

const LIST_BASE: &str = concat!(
    "SELECT a.id, a.serial_no, m.asset_type, b.name AS brand, m.name AS model,
        a.owned_by, COALESCE(cs.status, 'available') AS status,
        cs.assigned_to_user AS assigned_to, u.name AS assigned_to_name,
        a.purchased_date, a.warranty_exp_date, a.created_at
     FROM assets a
     JOIN asset_models m ON m.id = a.model_id
     JOIN asset_brands b ON b.id = m.brand_id
     ",
    current_status_join!(),
    "
     LEFT JOIN users u ON u.id = cs.assigned_to_user"
);

const DETAIL_QUERY: &str = concat!(
    "SELECT a.id, a.serial_no, a.owned_by, a.purchased_date,
        a.warranty_start_date, a.warranty_exp_date, a.specs_id,
        m.id AS model_id, m.name AS model_name, m.asset_type,
        b.id AS brand_id, b.name AS brand_name,
        COALESCE(cs.status, 'available') AS status,
        cs.assigned_to_user AS assigned_to,
        a.created_by, a.created_at
     FROM assets a
     JOIN asset_models m ON m.id = a.model_id
     JOIN asset_brands b ON b.id = m.brand_id
     ",
    current_status_join!(),
    "
     WHERE a.id = $1 AND a.archived_at IS NULL"
);

pub struct AssetRepo;

impl AssetRepo {
    pub async fn create(conn: &mut PgConnection, input: &NewAsset) -> Result<Uuid, DatabaseError> {
        let id = sqlx::query_scalar(
            "INSERT INTO assets (
                model_id, specs_id, serial_no, owned_by, purchased_date,
                warranty_start_date, warranty_exp_date, created_by
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(input.model_id)
        .bind(input.specs_id)
        .bind(&input.serial_no)
        .bind(input.owned_by)
        .bind(input.purchased_date)
        .bind(input.warranty_start_date)
        .bind(input.warranty_exp_date)
        .bind(input.created_by)
        .fetch_one(&mut *conn)
        .await?;
        Ok(id)
    }

    /// Apply the non-`None` fields of `patch` and stamp the editor.
    ///
    /// Returns `false` if the asset does not exist or is archived.
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        patch: &AssetPatch,
        updated_by: Uuid,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE assets SET
                serial_no = COALESCE($2, serial_no),
                owned_by = COALESCE($3, owned_by),
                purchased_date = COALESCE($4, purchased_date),
                warranty_start_date = COALESCE($5, warranty_start_date),
                warranty_exp_date = COALESCE($6, warranty_exp_date),
                updated_by = $7,
                updated_at = now()
             WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .bind(&patch.serial_no)
        .bind(patch.owned_by)
        .bind(patch.purchased_date)
        .bind(patch.warranty_start_date)
        .bind(patch.warranty_exp_date)
        .bind(updated_by)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Take a row lock on a live asset for the rest of the transaction.
    ///
    /// Returns `false` if the asset does not exist or is archived.
    pub async fn lock_for_update(conn: &mut PgConnection, id: Uuid) -> Result<bool, DatabaseError> {
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM assets WHERE id = $1 AND archived_at IS NULL FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(locked.is_some())
    }

    pub async fn archive(conn: &mut PgConnection, id: Uuid, archived_by: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE assets SET archived_at = now(), updated_by = $2, updated_at = now()
             WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .bind(archived_by)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether the asset was ever registered, archived or not
    pub async fn exists<'e, E>(executor: E, id: Uuid) -> Result<bool, DatabaseError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let exists = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM assets WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    /// Live asset joined with model, brand and current status
    pub async fn find_with_model<'e, E>(executor: E, id: Uuid) -> Result<Option<AssetWithModel>, DatabaseError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, AssetWithModel>(DETAIL_QUERY)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Live assets matching `filter`, newest first
    pub async fn list(pool: &PgPool, filter: &AssetListFilter, page: Page) -> Result<Vec<AssetSummary>, DatabaseError> {
        let query = Self::list_filter(filter, page)?;
        QueryBuilder::<AssetSummary>::new(&query)?.select_all(pool).await
    }

    fn list_filter(filter: &AssetListFilter, page: Page) -> Result<Filter, DatabaseError> {
        let mut query = Filter::new(LIST_BASE)
            .order(FilterOrder::new().desc("a.created_at").desc("a.id"))
            .page(page)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        let conditions = query.where_mut();
        conditions
            .raw("a.archived_at IS NULL")
            .search(SEARCH_COLUMNS, filter.search.as_deref());
        if let Some(asset_type) = filter.asset_type {
            conditions.eq("m.asset_type::text", SqlParam::Text(asset_type.to_string()));
        }
        if let Some(status) = filter.status {
            conditions.eq("COALESCE(cs.status, 'available')::text", SqlParam::Text(status.to_string()));
        }
        if let Some(owned_by) = filter.owned_by {
            conditions.eq("a.owned_by::text", SqlParam::Text(owned_by.to_string()));
        }
        Ok(query)
    }
}
