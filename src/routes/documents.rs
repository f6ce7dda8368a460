//! Document routes
//!
//! - `POST /api/documents` - one listing page as a folder tree
//! - `POST /api/documents/upload-url` - presigned upload URL
//! - `POST /api/documents/delete` - delete one object
//! - `POST /api/documents/delete-batch` - delete many, per-item results
//!
//! Each handler makes a single store call. Failures are logged with their
//! cause and answered with a fixed message.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{error, info, warn};

use crate::folders::FolderTree;
use crate::models::{
    AppState, DeleteBatchRequest, DeleteBatchResponse, DeleteFileRequest, DeleteFileResponse,
    DeleteOutcome, ListDocumentsRequest, ListDocumentsResponse, UploadUrlRequest,
    UploadUrlResponse,
};
use crate::types::{AppError, AppResult};
use crate::utils::run_bounded;

pub const LIST_FAILED_MESSAGE: &str = "Get S3 Bucket data failed - Internal Server Error";
pub const UPLOAD_URL_FAILED_MESSAGE: &str = "Failed to generate signed URL";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete file";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/documents", post(list_documents))
        .route("/api/documents/upload-url", post(upload_url))
        .route("/api/documents/delete", post(delete_file))
        .route("/api/documents/delete-batch", post(delete_batch))
}

/// POST /api/documents - list one page under an optional prefix. The body
/// may be omitted entirely.
async fn list_documents(
    State(state): State<AppState>,
    request: Option<Json<ListDocumentsRequest>>,
) -> Response {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let prefix = request.prefix.unwrap_or_default();

    match state.store.list_page(&prefix, request.continuation_token).await {
        Ok(page) => {
            let tree = FolderTree::build(&page.records);
            if !tree.conflicts.is_empty() {
                warn!(count = tree.conflicts.len(), "Listing contained colliding keys");
            }
            info!(prefix = %prefix, count = page.records.len(), truncated = page.is_truncated, "Listed documents");

            let response = ListDocumentsResponse {
                folders: tree.into_root(),
                contents: page.records,
                next_continuation_token: page.next_continuation_token,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(bucket = %state.store.bucket(), prefix = %prefix, "Failed to list documents: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "message": LIST_FAILED_MESSAGE })),
            )
                .into_response()
        }
    }
}

/// POST /api/documents/upload-url - presign a PUT for folderPath + fileName
async fn upload_url(
    State(state): State<AppState>,
    Json(request): Json<UploadUrlRequest>,
) -> Response {
    let key = request.object_key();
    let expires_in = state.config.storage.upload_url_expiry_secs;

    match state.store.presign_upload(&key, &request.file_type, expires_in).await {
        Ok(signed_url) => {
            info!(key = %key, file_type = %request.file_type, expires_in, "Issued upload URL");
            (StatusCode::OK, Json(UploadUrlResponse { signed_url })).into_response()
        }
        Err(e) => {
            error!(key = %key, "Failed to presign upload: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": UPLOAD_URL_FAILED_MESSAGE })),
            )
                .into_response()
        }
    }
}

/// POST /api/documents/delete - delete a single key
async fn delete_file(
    State(state): State<AppState>,
    Json(request): Json<DeleteFileRequest>,
) -> Response {
    match state.store.delete_object(&request.key).await {
        Ok(()) => {
            info!(key = %request.key, "Deleted document");
            (StatusCode::OK, Json(DeleteFileResponse { deleted: request.key })).into_response()
        }
        Err(e) => {
            error!(key = %request.key, "Failed to delete document: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": DELETE_FAILED_MESSAGE })),
            )
                .into_response()
        }
    }
}

/// POST /api/documents/delete-batch - bounded fan-out, one result per key
async fn delete_batch(
    State(state): State<AppState>,
    Json(request): Json<DeleteBatchRequest>,
) -> AppResult<Json<DeleteBatchResponse>> {
    if request.keys.is_empty() {
        return Err(AppError::InvalidRequest("keys must not be empty".to_string()));
    }

    let concurrency = state.config.console.delete_concurrency;
    let store = state.store.clone();

    let results = run_bounded(request.keys, concurrency, |key| {
        let store = store.clone();
        async move { store.delete_object(&key).await }
    })
    .await
    .into_iter()
    .map(|(key, result)| match result {
        Ok(()) => DeleteOutcome::ok(key),
        Err(e) => {
            warn!(key = %key, "Batch delete item failed: {}", e);
            DeleteOutcome::failed(key, DELETE_FAILED_MESSAGE)
        }
    })
    .collect::<Vec<_>>();

    let failed = results.iter().filter(|r| !r.deleted).count();
    info!(total = results.len(), failed, "Batch delete finished");

    Ok(Json(DeleteBatchResponse { results }))
}
