//! Brand and model lookups used while registering assets.

use sqlx::PgConnection;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{AssetModel, Brand};
use crate::types::AssetType;

pub struct CatalogRepo;

impl CatalogRepo {
    /// Case-insensitive get-or-create of a brand.
    pub async fn get_or_create_brand(conn: &mut PgConnection, name: &str) -> Result<Brand, DatabaseError> {
        if let Some(brand) = Self::find_brand(conn, name).await? {
            return Ok(brand);
        }

        let inserted = sqlx::query_as::<_, Brand>(
            "INSERT INTO asset_brands (name) VALUES ($1)
             ON CONFLICT DO NOTHING
             RETURNING id, name",
        )
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

        match inserted {
            Some(brand) => {
                tracing::info!(brand_id = %brand.id, brand = name, "Created brand");
                Ok(brand)
            }
            // Lost a race with a concurrent insert of the same name
            None => Self::find_brand(conn, name)
                .await?
                .ok_or_else(|| DatabaseError::NotFound(format!("brand {}", name))),
        }
    }

    /// Case-insensitive get-or-create of a model, scoped by brand and asset type.
    pub async fn get_or_create_model(
        conn: &mut PgConnection,
        brand_id: Uuid,
        name: &str,
        asset_type: AssetType,
    ) -> Result<AssetModel, DatabaseError> {
        if let Some(model) = Self::find_model(conn, brand_id, name, asset_type).await? {
            return Ok(model);
        }

        let inserted = sqlx::query_as::<_, AssetModel>(
            "INSERT INTO asset_models (name, brand_id, asset_type) VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING
             RETURNING id, name, asset_type, brand_id",
        )
        .bind(name)
        .bind(brand_id)
        .bind(asset_type)
        .fetch_optional(&mut *conn)
        .await?;

        match inserted {
            Some(model) => {
                tracing::info!(model_id = %model.id, model = name, %asset_type, "Created model");
                Ok(model)
            }
            None => Self::find_model(conn, brand_id, name, asset_type)
                .await?
                .ok_or_else(|| DatabaseError::NotFound(format!("model {}", name))),
        }
    }

    async fn find_brand(conn: &mut PgConnection, name: &str) -> Result<Option<Brand>, DatabaseError> {
        let brand = sqlx::query_as::<_, Brand>("SELECT id, name FROM asset_brands WHERE lower(name) = lower($1)")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(brand)
    }

    async fn find_model(
        conn: &mut PgConnection,
        brand_id: Uuid,
        name: &str,
        asset_type: AssetType,
    ) -> Result<Option<AssetModel>, DatabaseError> {
        let model = sqlx::query_as::<_, AssetModel>(
            "SELECT id, name, asset_type, brand_id FROM asset_models
             WHERE lower(name) = lower($1) AND brand_id = $2 AND asset_type = $3",
        )
        .bind(name)
        .bind(brand_id)
        .bind(asset_type)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(model)
    }
}
