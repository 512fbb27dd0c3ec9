use axum::extract::{Path, RawQuery, State};
use axum::Extension;

use crate::app::AppState;
use crate::database::models::{User, UserDetails, UserListFilter, UserPatch, UserSummary, UserTimelineEntry};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::CreateUserRequest;

use super::{parse_id, ApiJson, ListParams};

/// GET /api/users?search=&user_type=&role=&asset_status=&page=&limit=
pub async fn list(State(state): State<AppState>, RawQuery(query): RawQuery) -> ApiResult<Vec<UserSummary>> {
    let params = ListParams::parse(query.as_deref());
    let filter = UserListFilter {
        search: params.text("search").map(str::to_string),
        user_types: params.many("user_type")?,
        roles: params.many("role")?,
        asset_statuses: params.many("asset_status")?,
    };
    let users = state.users.list(&filter, params.page(&state.api)).await?;
    Ok(ApiResponse::success(users))
}

/// POST /api/users
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<User> {
    let created = state.users.create(&user.actor(), req).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/users/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<UserDetails> {
    let details = state.users.details(parse_id(&id, "user")?).await?;
    Ok(ApiResponse::success(details))
}

/// PATCH /api/users/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> ApiResult<User> {
    let updated = state.users.update(&user.actor(), parse_id(&id, "user")?, patch).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/users/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.users.delete(&user.actor(), parse_id(&id, "user")?).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/users/:id/timeline
pub async fn timeline(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<UserTimelineEntry>> {
    let entries = state.users.timeline(parse_id(&id, "user")?).await?;
    Ok(ApiResponse::success(entries))
}
