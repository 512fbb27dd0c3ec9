//! Specs registry: maps an asset type to its attribute table, validates
//! payloads against the variant schema and persists them.

pub mod patch;
pub mod registry;

use serde_json::Value;
use sqlx::{PgConnection, PgExecutor};
use thiserror::Error;
use uuid::Uuid;

use crate::database::DatabaseError;
use crate::types::{AssetType, UnknownVariant};

pub use patch::FieldPatch;
pub use registry::*;

#[derive(Debug, Error)]
pub enum SpecsError {
    #[error("unsupported asset type: {0}")]
    UnsupportedType(String),

    #[error("invalid {asset_type} specs: {message}")]
    Validation { asset_type: AssetType, message: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl SpecsError {
    pub(crate) fn validation(asset_type: AssetType, err: serde_json::Error) -> Self {
        SpecsError::Validation {
            asset_type,
            message: err.to_string(),
        }
    }
}

impl From<UnknownVariant> for SpecsError {
    fn from(err: UnknownVariant) -> Self {
        SpecsError::UnsupportedType(err.value)
    }
}

/// Resolve an asset type tag; unknown tags are `UnsupportedType`
pub fn resolve_type(tag: &str) -> Result<AssetType, SpecsError> {
    Ok(tag.parse::<AssetType>()?)
}

/// Validate `payload` as the specs of `asset_type` and insert it, returning the new row id
pub async fn create_specs(
    conn: &mut PgConnection,
    asset_type: AssetType,
    payload: &Value,
) -> Result<Uuid, SpecsError> {
    let specs = AssetSpecs::from_payload(asset_type, payload)?;
    let id = specs.insert(conn).await?;
    tracing::debug!(specs_id = %id, table = specs.table(), "Inserted specs");
    Ok(id)
}

/// Apply the fields present in `payload` to an existing specs row.
///
/// A payload with no writable fields is a no-op.
pub async fn update_specs(
    conn: &mut PgConnection,
    asset_type: AssetType,
    specs_id: Uuid,
    payload: &Value,
) -> Result<(), SpecsError> {
    let patch = SpecsPatch::from_payload(asset_type, payload)?;
    if patch.is_empty() {
        tracing::debug!(%specs_id, %asset_type, "Specs update carried no fields");
        return Ok(());
    }
    patch.apply(conn, specs_id).await?;
    Ok(())
}

pub async fn get_specs<'e, E>(executor: E, asset_type: AssetType, specs_id: Uuid) -> Result<AssetSpecs, SpecsError>
where
    E: PgExecutor<'e>,
{
    AssetSpecs::fetch(executor, asset_type, specs_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("{} specs {}", asset_type, specs_id)).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_is_unsupported() {
        let err = resolve_type("toaster").unwrap_err();
        assert!(matches!(err, SpecsError::UnsupportedType(ref t) if t == "toaster"));
        assert_eq!(resolve_type("pen_drive").unwrap(), AssetType::PenDrive);
    }
}
