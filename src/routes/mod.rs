//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/documents` - Listing, upload URLs and deletion
//! - `/api/kendra` - Search index sync trigger and status
//! - `/api/health` - Health checks

pub mod documents;
pub mod health;
pub mod sync;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let api_router = Router::new()
        .merge(documents::router())
        .merge(sync::router())
        .merge(health::router())
        .with_state(state);

    middleware::apply_cors(api_router).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::{Config, ConsoleConfig, IndexConfig, ServerConfig, StorageConfig};
    use crate::search::MemorySearchIndex;
    use crate::storage::MemoryObjectStore;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    pub fn test_config(bucket: &str) -> Config {
        Config {
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".to_string(),
                log_dir: None,
            },
            storage: StorageConfig {
                bucket: bucket.to_string(),
                region: "us-east-1".to_string(),
                endpoint: None,
                access_key_id: None,
                secret_access_key: None,
                upload_url_expiry_secs: 300,
                list_max_keys: None,
            },
            index: IndexConfig {
                index_id: None,
                data_source_id: None,
                region: "us-east-1".to_string(),
            },
            console: ConsoleConfig::default(),
        }
    }

    pub fn test_state(store: Arc<MemoryObjectStore>) -> AppState {
        test_state_with(store, Arc::new(MemorySearchIndex::new()))
    }

    pub fn test_state_with(
        store: Arc<MemoryObjectStore>,
        index: Arc<MemorySearchIndex>,
    ) -> AppState {
        AppState {
            config: test_config(store.bucket_name()),
            store,
            index,
        }
    }

    pub fn test_app(state: AppState) -> Router {
        create_router(state)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, headers, json)
    }

    /// Send one JSON request; the response body is parsed as JSON when possible.
    pub async fn call(
        app: Router,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, HeaderMap, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    /// Send a request with no body and no content type
    pub async fn call_empty(
        app: Router,
        method: &str,
        uri: &str,
    ) -> (StatusCode, HeaderMap, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(app, request).await
    }

    pub async fn get(app: Router, uri: &str) -> (StatusCode, HeaderMap, serde_json::Value) {
        call_empty(app, "GET", uri).await
    }
}
