use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::specs::AssetSpecs;
use crate::types::{AssetStatusKind, AssetType, OwnedBy};

#[derive(Debug, Clone)]
pub struct NewAsset {
    pub model_id: Uuid,
    pub specs_id: Uuid,
    pub serial_no: String,
    pub owned_by: OwnedBy,
    pub purchased_date: NaiveDate,
    pub warranty_start_date: Option<NaiveDate>,
    pub warranty_exp_date: Option<NaiveDate>,
    pub created_by: Uuid,
}

/// Asset columns that may change after creation. `None` leaves the column as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetPatch {
    pub serial_no: Option<String>,
    pub owned_by: Option<OwnedBy>,
    pub purchased_date: Option<NaiveDate>,
    pub warranty_start_date: Option<NaiveDate>,
    pub warranty_exp_date: Option<NaiveDate>,
}

/// Row of the asset list, joined with brand, model and current status
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssetSummary {
    pub id: Uuid,
    pub serial_no: String,
    pub asset_type: AssetType,
    pub brand: String,
    pub model: String,
    pub owned_by: OwnedBy,
    pub status: AssetStatusKind,
    pub assigned_to: Option<Uuid>,
    pub assigned_to_name: Option<String>,
    pub purchased_date: NaiveDate,
    pub warranty_exp_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct AssetListFilter {
    pub search: Option<String>,
    pub asset_type: Option<AssetType>,
    pub status: Option<AssetStatusKind>,
    pub owned_by: Option<OwnedBy>,
}

/// A live asset together with its model, brand and current status
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssetWithModel {
    pub id: Uuid,
    pub serial_no: String,
    pub owned_by: OwnedBy,
    pub purchased_date: NaiveDate,
    pub warranty_start_date: Option<NaiveDate>,
    pub warranty_exp_date: Option<NaiveDate>,
    pub specs_id: Uuid,
    pub model_id: Uuid,
    pub model_name: String,
    pub asset_type: AssetType,
    pub brand_id: Uuid,
    pub brand_name: String,
    pub status: AssetStatusKind,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetDetail {
    #[serde(flatten)]
    pub asset: AssetWithModel,
    pub specs: AssetSpecs,
}
