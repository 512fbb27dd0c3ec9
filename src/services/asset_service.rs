//! Asset lifecycle coordinator: create, update, assign, retrieve and archive
//! assets, keeping the asset row, its specs row and the ledger consistent.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::ServiceError;
use crate::database::models::{
    AssetDetail, AssetListFilter, AssetPatch, AssetStatusEntry, AssetSummary, AssetTimelineEntry, AssetWithModel,
    NewAsset, UserTimelineEntry,
};
use crate::database::{AssetRepo, CatalogRepo, Database, LedgerRepo, UserRepo};
use crate::filter::Page;
use crate::specs;
use crate::types::{Actor, AssetStatusKind, OwnedBy};

#[derive(Debug, Clone, Deserialize)]
pub struct BrandRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateModelRequest {
    pub name: String,
    pub asset_type: String,
    pub brand: BrandRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssetRequest {
    pub model: CreateModelRequest,
    pub serial_no: String,
    pub owned_by: OwnedBy,
    pub purchased_date: Option<NaiveDate>,
    pub warranty_start_date: Option<NaiveDate>,
    pub warranty_exp_date: Option<NaiveDate>,
    #[serde(default)]
    pub specs: Value,
    pub status: Option<AssetStatusKind>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAssetRequest {
    #[serde(flatten)]
    pub fields: AssetPatch,
    #[serde(default)]
    pub specs: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignAssetRequest {
    pub asset_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Clone, Debug)]
pub struct AssetService {
    db: Database,
}

impl AssetService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register an asset: brand, model, specs, asset row and its initial
    /// ledger row are written in one transaction.
    pub async fn create(&self, actor: &Actor, req: CreateAssetRequest) -> Result<Uuid, ServiceError> {
        let serial_no = req.serial_no.trim();
        if serial_no.is_empty() {
            return Err(ServiceError::validation("serial_no is required"));
        }
        let purchased_date = req
            .purchased_date
            .ok_or_else(|| ServiceError::validation("purchased_date is required"))?;
        let brand_name = req.model.brand.name.trim();
        let model_name = req.model.name.trim();
        if brand_name.is_empty() || model_name.is_empty() {
            return Err(ServiceError::validation("model name and brand name are required"));
        }
        validate_warranty(req.warranty_start_date, req.warranty_exp_date)?;
        let initial_status = match req.status {
            None => AssetStatusKind::Available,
            Some(AssetStatusKind::Assigned) => {
                return Err(ServiceError::validation(
                    "initial status must be available or in_service; use assign to hand out an asset",
                ))
            }
            Some(status) => status,
        };
        let asset_type = specs::resolve_type(&req.model.asset_type)?;

        let mut tx = self.db.pool().begin().await?;

        let brand = CatalogRepo::get_or_create_brand(&mut tx, brand_name).await?;
        let model = CatalogRepo::get_or_create_model(&mut tx, brand.id, model_name, asset_type).await?;
        let specs_id = specs::create_specs(&mut tx, asset_type, &req.specs).await?;

        let asset_id = AssetRepo::create(
            &mut tx,
            &NewAsset {
                model_id: model.id,
                specs_id,
                serial_no: serial_no.to_string(),
                owned_by: req.owned_by,
                purchased_date,
                warranty_start_date: req.warranty_start_date,
                warranty_exp_date: req.warranty_exp_date,
                created_by: actor.user_id,
            },
        )
        .await?;
        LedgerRepo::record_status(&mut tx, asset_id, initial_status).await?;

        tx.commit().await?;

        info!(%asset_id, %asset_type, serial_no, created_by = %actor.user_id, "Asset created");
        Ok(asset_id)
    }

    /// Patch asset columns and, when supplied, the specs row of the asset's
    /// existing type. The asset type itself cannot change.
    pub async fn update(&self, actor: &Actor, asset_id: Uuid, mut req: UpdateAssetRequest) -> Result<(), ServiceError> {
        let existing = self.find(asset_id).await?;

        if let Some(serial_no) = req.fields.serial_no.as_mut() {
            *serial_no = serial_no.trim().to_string();
            if serial_no.is_empty() {
                return Err(ServiceError::validation("serial_no cannot be empty"));
            }
        }
        validate_warranty(
            req.fields.warranty_start_date.or(existing.warranty_start_date),
            req.fields.warranty_exp_date.or(existing.warranty_exp_date),
        )?;

        let mut tx = self.db.pool().begin().await?;

        if !AssetRepo::update(&mut tx, asset_id, &req.fields, actor.user_id).await? {
            return Err(ServiceError::not_found(format!("asset {} not found", asset_id)));
        }
        if let Some(payload) = req.specs.as_ref().filter(|v| !v.is_null()) {
            specs::update_specs(&mut tx, existing.asset_type, existing.specs_id, payload).await?;
        }

        tx.commit().await?;

        info!(%asset_id, updated_by = %actor.user_id, "Asset updated");
        Ok(())
    }

    /// Hand an available asset to a user.
    ///
    /// The asset row is locked before the availability check so concurrent
    /// assignments of the same asset serialize; the partial unique index on
    /// the ledger backs this up.
    pub async fn assign(&self, actor: &Actor, req: AssignAssetRequest) -> Result<AssetStatusEntry, ServiceError> {
        let mut tx = self.db.pool().begin().await?;

        if !AssetRepo::lock_for_update(&mut tx, req.asset_id).await? {
            return Err(ServiceError::not_found(format!("asset {} not found", req.asset_id)));
        }
        if !UserRepo::lock_active(&mut tx, req.user_id, false).await? {
            return Err(ServiceError::not_found(format!("user {} not found", req.user_id)));
        }
        if !LedgerRepo::is_asset_available(&mut *tx, req.asset_id).await? {
            return Err(ServiceError::conflict("asset is not available for assignment"));
        }

        let entry = LedgerRepo::insert_assignment(&mut tx, req.asset_id, req.user_id).await?;
        tx.commit().await?;

        info!(asset_id = %req.asset_id, user_id = %req.user_id, assigned_by = %actor.user_id, "Asset assigned");
        Ok(entry)
    }

    /// Archive the asset's live assignment, returning it to its prior status
    pub async fn retrieve(&self, actor: &Actor, asset_id: Uuid) -> Result<(), ServiceError> {
        let mut tx = self.db.pool().begin().await?;

        if !AssetRepo::lock_for_update(&mut tx, asset_id).await? {
            return Err(ServiceError::not_found(format!("asset {} not found", asset_id)));
        }
        let entry_id = LedgerRepo::active_assignment_id(&mut tx, asset_id)
            .await?
            .ok_or_else(|| ServiceError::invalid_state("asset has no active assignment"))?;
        LedgerRepo::archive_entry(&mut tx, entry_id).await?;

        tx.commit().await?;

        info!(%asset_id, retrieved_by = %actor.user_id, "Asset retrieved");
        Ok(())
    }

    /// Soft-delete an asset that is not currently assigned
    pub async fn archive(&self, actor: &Actor, asset_id: Uuid) -> Result<(), ServiceError> {
        let mut tx = self.db.pool().begin().await?;

        if !AssetRepo::lock_for_update(&mut tx, asset_id).await? {
            return Err(ServiceError::not_found(format!("asset {} not found", asset_id)));
        }
        if !LedgerRepo::is_asset_available(&mut *tx, asset_id).await? {
            return Err(ServiceError::invalid_state("asset is assigned; retrieve it before archiving"));
        }
        AssetRepo::archive(&mut tx, asset_id, actor.user_id).await?;

        tx.commit().await?;

        info!(%asset_id, archived_by = %actor.user_id, "Asset archived");
        Ok(())
    }

    pub async fn is_available(&self, asset_id: Uuid) -> Result<bool, ServiceError> {
        Ok(LedgerRepo::is_asset_available(self.db.pool(), asset_id).await?)
    }

    pub async fn list(&self, filter: &AssetListFilter, page: Page) -> Result<Vec<AssetSummary>, ServiceError> {
        Ok(AssetRepo::list(self.db.pool(), filter, page).await?)
    }

    pub async fn find(&self, asset_id: Uuid) -> Result<AssetWithModel, ServiceError> {
        AssetRepo::find_with_model(self.db.pool(), asset_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("asset {} not found", asset_id)))
    }

    /// Asset with model, brand, current status and its specs record
    pub async fn detail(&self, asset_id: Uuid) -> Result<AssetDetail, ServiceError> {
        let asset = self.find(asset_id).await?;
        let specs = specs::get_specs(self.db.pool(), asset.asset_type, asset.specs_id).await?;
        Ok(AssetDetail { asset, specs })
    }

    pub async fn timeline(&self, asset_id: Uuid) -> Result<Vec<AssetTimelineEntry>, ServiceError> {
        if !AssetRepo::exists(self.db.pool(), asset_id).await? {
            return Err(ServiceError::not_found(format!("asset {} not found", asset_id)));
        }
        Ok(LedgerRepo::timeline(self.db.pool(), asset_id).await?)
    }

    pub async fn user_timeline(&self, user_id: Uuid) -> Result<Vec<UserTimelineEntry>, ServiceError> {
        Ok(LedgerRepo::user_timeline(self.db.pool(), user_id).await?)
    }
}

fn validate_warranty(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), ServiceError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ServiceError::validation(
            "warranty_exp_date cannot be before warranty_start_date",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn warranty_must_not_end_before_it_starts() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1);
        let end = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(validate_warranty(start, end).is_err());
        assert!(validate_warranty(end, start).is_ok());
        assert!(validate_warranty(None, end).is_ok());
    }

    #[test]
    fn create_request_reads_nested_model() {
        let req: CreateAssetRequest = serde_json::from_value(json!({
            "model": {"name": "XPS 13", "asset_type": "laptop", "brand": {"name": "Dell"}},
            "serial_no": "SN-1",
            "owned_by": "remote_state",
            "purchased_date": "2024-01-15",
            "specs": {"processor": "i7"}
        }))
        .unwrap();
        assert_eq!(req.model.brand.name, "Dell");
        assert_eq!(req.owned_by, OwnedBy::RemoteState);
        assert!(req.status.is_none());
    }

    #[test]
    fn update_request_splits_fields_and_specs() {
        let req: UpdateAssetRequest = serde_json::from_value(json!({
            "serial_no": "SN-2",
            "specs": {"ram_gb": 32}
        }))
        .unwrap();
        assert_eq!(req.fields.serial_no.as_deref(), Some("SN-2"));
        assert!(req.fields.owned_by.is_none());
        assert_eq!(req.specs, Some(json!({"ram_gb": 32})));
    }
}
