use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /health - pings the database
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    state.db.health_check().await?;
    Ok(ApiResponse::success(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
