use axum::extract::{Path, RawQuery, State};
use axum::Extension;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::{AssetDetail, AssetListFilter, AssetStatusEntry, AssetSummary, AssetTimelineEntry};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{AssignAssetRequest, CreateAssetRequest, UpdateAssetRequest};

use super::{parse_id, ApiJson, ListParams};

/// GET /api/assets?search=&asset_type=&status=&owned_by=&page=&limit=
pub async fn list(State(state): State<AppState>, RawQuery(query): RawQuery) -> ApiResult<Vec<AssetSummary>> {
    let params = ListParams::parse(query.as_deref());
    let filter = AssetListFilter {
        search: params.text("search").map(str::to_string),
        asset_type: params.one("asset_type")?,
        status: params.one("status")?,
        owned_by: params.one("owned_by")?,
    };
    let assets = state.assets.list(&filter, params.page(&state.api)).await?;
    Ok(ApiResponse::success(assets))
}

/// POST /api/assets
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateAssetRequest>,
) -> ApiResult<Value> {
    let asset_id = state.assets.create(&user.actor(), req).await?;
    Ok(ApiResponse::created(json!({ "asset_id": asset_id })))
}

/// GET /api/assets/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<AssetDetail> {
    let asset = state.assets.detail(parse_id(&id, "asset")?).await?;
    Ok(ApiResponse::success(asset))
}

/// PATCH /api/assets/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateAssetRequest>,
) -> ApiResult<Value> {
    let asset_id = parse_id(&id, "asset")?;
    state.assets.update(&user.actor(), asset_id, req).await?;
    Ok(ApiResponse::success(json!({ "asset_id": asset_id })))
}

/// DELETE /api/assets/:id
pub async fn archive(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.assets.archive(&user.actor(), parse_id(&id, "asset")?).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/assets/assign
pub async fn assign(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<AssignAssetRequest>,
) -> ApiResult<AssetStatusEntry> {
    let entry = state.assets.assign(&user.actor(), req).await?;
    Ok(ApiResponse::created(entry))
}

/// POST /api/assets/:id/retrieve
pub async fn retrieve(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let asset_id = parse_id(&id, "asset")?;
    state.assets.retrieve(&user.actor(), asset_id).await?;
    Ok(ApiResponse::success(json!({ "asset_id": asset_id, "retrieved": true })))
}

/// GET /api/assets/:id/timeline
pub async fn timeline(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<AssetTimelineEntry>> {
    let entries = state.assets.timeline(parse_id(&id, "asset")?).await?;
    Ok(ApiResponse::success(entries))
}
