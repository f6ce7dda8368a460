//! Object storage layer
//!
//! The handlers only ever need three calls against the bucket: list one
//! page, presign an upload, delete one key. [`ObjectStore`] captures those;
//! [`S3Store`] talks to S3 (or any S3-compatible endpoint) and
//! [`MemoryObjectStore`] backs tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod s3_client;

pub use memory::MemoryObjectStore;
pub use s3_client::S3Store;

/// Errors returned by an object store backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {key}")]
    NotFound { key: String },

    #[error("Invalid storage configuration: {0}")]
    Config(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// One object as reported by a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

impl ObjectRecord {
    pub fn new(key: impl Into<String>, size: u64, last_modified: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified,
        }
    }
}

/// A single upstream listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub records: Vec<ObjectRecord>,
    pub next_continuation_token: Option<String>,
    pub is_truncated: bool,
}

/// Minimal object store surface used by the document handlers
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Fetch exactly one page of objects under `prefix`
    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> StorageResult<ObjectPage>;

    /// Presigned PUT URL for `key`, valid for `expires_in_secs`
    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in_secs: u32,
    ) -> StorageResult<String>;

    async fn delete_object(&self, key: &str) -> StorageResult<()>;

    /// Bucket name, for logging
    fn bucket(&self) -> &str;
}
