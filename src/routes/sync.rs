//! Search index sync routes
//!
//! - `POST /api/kendra/sync` - start a data-source sync job
//! - `GET /api/kendra/status` - `"STILL SYNCING"` or `"DONE SYNCING"`

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, error, info};

use crate::models::{AppState, SyncStartedResponse};

pub const SYNC_FAILED_MESSAGE: &str = "Failed to start sync";
pub const STATUS_FAILED_MESSAGE: &str = "Failed to check sync status";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/kendra/sync", post(sync_kendra))
        .route("/api/kendra/status", get(kendra_is_syncing))
}

/// POST /api/kendra/sync
async fn sync_kendra(State(state): State<AppState>) -> Response {
    match state.index.start_sync().await {
        Ok(job) => {
            info!(execution_id = ?job.execution_id, "Sync requested");
            let response = SyncStartedResponse {
                status: "STARTED SYNCING".to_string(),
                execution_id: job.execution_id,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to start sync: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": SYNC_FAILED_MESSAGE })),
            )
                .into_response()
        }
    }
}

/// GET /api/kendra/status
async fn kendra_is_syncing(State(state): State<AppState>) -> Response {
    match state.index.sync_status().await {
        Ok(status) => {
            debug!(status = %status, "Sync status");
            (StatusCode::OK, Json(status.as_str())).into_response()
        }
        Err(e) => {
            error!("Failed to check sync status: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": STATUS_FAILED_MESSAGE })),
            )
                .into_response()
        }
    }
}
