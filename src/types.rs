// Shared error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::search::IndexError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Search index error: {0}")]
    Index(#[from] IndexError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            // Upstream detail stays in the logs
            AppError::InvalidRequest(msg) => msg.clone(),
            _ => "Internal Server Error".to_string(),
        };
        (status, Json(serde_json::json!({ "error": body }))).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
