//! HTTP client for the document API
//!
//! [`DocumentsApi`] is what the console needs from the backend;
//! [`HttpApiClient`] implements it with `reqwest` against a running
//! `doc-manager` server.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    DeleteBatchRequest, DeleteBatchResponse, DeleteFileRequest, ListDocumentsRequest,
    ListDocumentsResponse, UploadUrlRequest, UploadUrlResponse,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Invalid(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[async_trait]
pub trait DocumentsApi: Send + Sync {
    async fn get_documents(&self, request: ListDocumentsRequest)
        -> ClientResult<ListDocumentsResponse>;

    async fn upload_url(&self, request: &UploadUrlRequest) -> ClientResult<String>;

    /// PUT `data` to a presigned URL
    async fn upload_to_signed_url(
        &self,
        signed_url: &str,
        content_type: &str,
        data: Bytes,
    ) -> ClientResult<()>;

    async fn delete_file(&self, key: &str) -> ClientResult<()>;

    async fn delete_files(&self, keys: Vec<String>) -> ClientResult<DeleteBatchResponse>;

    async fn sync_kendra(&self) -> ClientResult<()>;

    /// Raw status string, `"STILL SYNCING"` while a job runs
    async fn kendra_is_syncing(&self) -> ClientResult<String>;
}

#[derive(Clone)]
pub struct HttpApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn non-2xx responses into [`ClientError::Status`]
async fn check(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl DocumentsApi for HttpApiClient {
    async fn get_documents(
        &self,
        request: ListDocumentsRequest,
    ) -> ClientResult<ListDocumentsResponse> {
        let response = self
            .http
            .post(self.url("/api/documents"))
            .json(&request)
            .send()
            .await?;
        let page: ListDocumentsResponse = check(response).await?.json().await?;
        debug!(count = page.contents.len(), "Fetched documents page");
        Ok(page)
    }

    async fn upload_url(&self, request: &UploadUrlRequest) -> ClientResult<String> {
        let response = self
            .http
            .post(self.url("/api/documents/upload-url"))
            .json(request)
            .send()
            .await?;
        let body: UploadUrlResponse = check(response).await?.json().await?;
        Ok(body.signed_url)
    }

    async fn upload_to_signed_url(
        &self,
        signed_url: &str,
        content_type: &str,
        data: Bytes,
    ) -> ClientResult<()> {
        let response = self
            .http
            .put(signed_url)
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_file(&self, key: &str) -> ClientResult<()> {
        let response = self
            .http
            .post(self.url("/api/documents/delete"))
            .json(&DeleteFileRequest { key: key.to_string() })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_files(&self, keys: Vec<String>) -> ClientResult<DeleteBatchResponse> {
        let response = self
            .http
            .post(self.url("/api/documents/delete-batch"))
            .json(&DeleteBatchRequest { keys })
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn sync_kendra(&self) -> ClientResult<()> {
        let response = self.http.post(self.url("/api/kendra/sync")).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn kendra_is_syncing(&self) -> ClientResult<String> {
        let response = self.http.get(self.url("/api/kendra/status")).send().await?;
        Ok(check(response).await?.json::<String>().await?)
    }
}
