//! User directory: users, their roles and directory projections.

use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{AssignedAsset, NewUser, User, UserListFilter, UserPatch, UserSummary};
use super::query_builder::QueryBuilder;
use crate::filter::{Filter, FilterOrder, Page, SqlParam};
use crate::types::Role;

const COLUMNS: &str = "id, name, email, phone, user_type, created_at, updated_at, updated_by, archived_at";

const SEARCH_COLUMNS: &[&str] = &["u.name", "u.email", "u.phone"];

const SUMMARY_BASE: &str = "SELECT u.id, u.name, u.email, u.phone, u.user_type,
        COALESCE(array_agg(r.role ORDER BY r.role) FILTER (WHERE r.role IS NOT NULL), '{}') AS roles,
        (SELECT COUNT(*) FROM asset_status s
         WHERE s.assigned_to_user = u.id AND s.status = 'assigned' AND s.archived_at IS NULL) AS active_assets,
        u.created_at
    FROM users u
    LEFT JOIN user_roles r ON r.user_id = u.id";

const HAS_ROLE: &str = "EXISTS (SELECT 1 FROM user_roles fr WHERE fr.user_id = u.id AND fr.role::text = ANY({}))";

const HAS_LIVE_STATUS: &str = "EXISTS (SELECT 1 FROM asset_status fs
        WHERE fs.assigned_to_user = u.id AND fs.archived_at IS NULL AND fs.status::text = ANY({}))";

pub struct UserRepo;

impl UserRepo {
    /// Insert a user holding a single role
    pub async fn create(conn: &mut PgConnection, input: &NewUser) -> Result<User, DatabaseError> {
        let query = format!(
            "INSERT INTO users (name, email, phone, user_type)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(input.user_type)
            .fetch_one(&mut *conn)
            .await?;

        Self::add_role(conn, user.id, input.role).await?;
        Ok(user)
    }

    pub async fn add_role(conn: &mut PgConnection, user_id: Uuid, role: Role) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(role)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn find_active<'e, E>(executor: E, id: Uuid) -> Result<Option<User>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND archived_at IS NULL");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    /// Case-insensitive lookup among live users
    pub async fn find_active_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1) AND archived_at IS NULL");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn roles<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Role>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let roles = sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role")
            .bind(user_id)
            .fetch_all(executor)
            .await?;
        Ok(roles)
    }

    /// Lock a live user row for the rest of the transaction.
    ///
    /// `exclusive` takes `FOR UPDATE`, otherwise `FOR SHARE`.
    pub async fn lock_active(conn: &mut PgConnection, id: Uuid, exclusive: bool) -> Result<bool, DatabaseError> {
        let query = if exclusive {
            "SELECT id FROM users WHERE id = $1 AND archived_at IS NULL FOR UPDATE"
        } else {
            "SELECT id FROM users WHERE id = $1 AND archived_at IS NULL FOR SHARE"
        };
        let locked: Option<Uuid> = sqlx::query_scalar(query).bind(id).fetch_optional(&mut *conn).await?;
        Ok(locked.is_some())
    }

    /// Apply the non-`None` fields of `patch` to a live user and stamp the editor
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        patch: &UserPatch,
        updated_by: Uuid,
    ) -> Result<Option<User>, DatabaseError> {
        let query = format!(
            "UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                user_type = COALESCE($5, user_type),
                updated_by = $6,
                updated_at = now()
             WHERE id = $1 AND archived_at IS NULL
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&patch.name)
            .bind(&patch.email)
            .bind(&patch.phone)
            .bind(patch.user_type)
            .bind(updated_by)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(user)
    }

    pub async fn soft_delete(conn: &mut PgConnection, id: Uuid, deleted_by: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET archived_at = now(), updated_by = $2, updated_at = now()
             WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .bind(deleted_by)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn summary(pool: &PgPool, id: Uuid) -> Result<Option<UserSummary>, DatabaseError> {
        let mut query = Filter::new(SUMMARY_BASE).group_by("u.id");
        query
            .where_mut()
            .raw("u.archived_at IS NULL")
            .eq("u.id", SqlParam::Uuid(id));
        QueryBuilder::<UserSummary>::new(&query)?.select_optional(pool).await
    }

    /// Live users matching `filter`, ordered by name
    pub async fn list(pool: &PgPool, filter: &UserListFilter, page: Page) -> Result<Vec<UserSummary>, DatabaseError> {
        let query = Self::list_filter(filter, page)?;
        QueryBuilder::<UserSummary>::new(&query)?.select_all(pool).await
    }

    fn list_filter(filter: &UserListFilter, page: Page) -> Result<Filter, DatabaseError> {
        let mut query = Filter::new(SUMMARY_BASE)
            .group_by("u.id")
            .order(FilterOrder::new().asc("u.name").asc("u.id"))
            .page(page)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        let conditions = query.where_mut();
        conditions
            .raw("u.archived_at IS NULL")
            .search(SEARCH_COLUMNS, filter.search.as_deref())
            .any_of("u.user_type::text", to_text(&filter.user_types));
        if !filter.roles.is_empty() {
            conditions.template(HAS_ROLE, SqlParam::TextArray(to_text(&filter.roles)));
        }
        if !filter.asset_statuses.is_empty() {
            conditions.template(HAS_LIVE_STATUS, SqlParam::TextArray(to_text(&filter.asset_statuses)));
        }
        Ok(query)
    }

    /// Assets currently assigned to the user
    pub async fn assigned_assets<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<AssignedAsset>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, AssignedAsset>(
            "SELECT a.id AS asset_id, a.serial_no, m.asset_type, b.name AS brand, m.name AS model,
                s.created_at AS assigned_at
             FROM asset_status s
             JOIN assets a ON a.id = s.asset_id
             JOIN asset_models m ON m.id = a.model_id
             JOIN asset_brands b ON b.id = m.brand_id
             WHERE s.assigned_to_user = $1 AND s.status = 'assigned' AND s.archived_at IS NULL
             ORDER BY s.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}

fn to_text<T: ToString>(values: &[T]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}
