use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{LoginRequest, LoginResponse, RefreshRequest};

use super::ApiJson;

/// POST /api/auth/login - password-less login by company email
pub async fn login(State(state): State<AppState>, ApiJson(req): ApiJson<LoginRequest>) -> ApiResult<LoginResponse> {
    let response = state.users.login(req).await?;
    Ok(ApiResponse::success(response))
}

/// POST /api/auth/refresh - new access token from a refresh token
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<LoginResponse> {
    let response = state.users.refresh(req).await?;
    Ok(ApiResponse::success(response))
}
