//! Monitoring job trigger

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::{error::ApiResult, state::ApiState};

/// POST /api/v1/jobs/monitor
///
/// Runs one full monitoring pass over the active fleet and returns the
/// summary. No body required; invoked by the external scheduler and by
/// manual triggers alike. Per-server failures are folded into the
/// summary (`parcial_sucesso`) and still answer 200; only a failure of
/// the run itself answers 500.
pub async fn run_monitor(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let summary = state.runner.run().await?;

    Ok(Json(json!({
        "success": true,
        "status": summary.status().as_str(),
        "processed": summary.processed,
        "succeeded": summary.succeeded,
        "alerts_fired": summary.alerts_fired,
        "errors": summary.errors,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
