use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{AssetStatusKind, AssetType};

/// One row of the assignment ledger
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssetStatusEntry {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub status: AssetStatusKind,
    pub assigned_to_user: Option<Uuid>,
    pub sent_to_service: Option<String>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssetTimelineEntry {
    pub id: Uuid,
    pub status: AssetStatusKind,
    pub assigned_to_user: Option<Uuid>,
    pub assigned_to_name: Option<String>,
    pub sent_to_service: Option<String>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserTimelineEntry {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub serial_no: String,
    pub asset_type: AssetType,
    pub brand: String,
    pub model: String,
    pub status: AssetStatusKind,
    pub assigned_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}
