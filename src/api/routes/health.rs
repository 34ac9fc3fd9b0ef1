//! Health check endpoint

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::{error::ApiResult, state::ApiState};

/// GET /api/v1/health
///
/// Probes the data store and reports its status.
pub async fn health_check(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let health = state.store.health_check().await?;

    Ok(Json(json!({
        "success": health.healthy,
        "status": if health.healthy { "ok" } else { "degraded" },
        "message": health.message,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
