use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::folders::FolderMap;
use crate::search::SearchIndex;
use crate::storage::{ObjectRecord, ObjectStore};

/// Handles shared by every request. Clients are injected rather than
/// created per call so tests can swap in the in-memory backends.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ObjectStore>,
    pub index: Arc<dyn SearchIndex>,
}

// API Request/Response types

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    pub folders: FolderMap,
    /// Flat records of the page, in store order
    #[serde(default)]
    pub contents: Vec<ObjectRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_continuation_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
    pub file_type: String,
}

impl UploadUrlRequest {
    /// Folder path and file name joined as given. No separator is inserted;
    /// callers pass `"docs/"`, not `"docs"`.
    pub fn object_key(&self) -> String {
        format!("{}{}", self.folder_path.as_deref().unwrap_or(""), self.file_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub signed_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFileRequest {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFileResponse {
    pub deleted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBatchRequest {
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub key: String,
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeleteOutcome {
    pub fn ok(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            deleted: true,
            error: None,
        }
    }

    pub fn failed(key: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            deleted: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteBatchResponse {
    pub results: Vec<DeleteOutcome>,
}

impl DeleteBatchResponse {
    pub fn failures(&self) -> impl Iterator<Item = &DeleteOutcome> {
        self.results.iter().filter(|r| !r.deleted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStartedResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub bucket: String,
}
