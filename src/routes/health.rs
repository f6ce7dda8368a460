use axum::{extract::State, routing::get, Json, Router};

use crate::models::{AppState, HealthResponse};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        bucket: state.store.bucket().to_string(),
    };

    Json(response)
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{get, test_app, test_state};
    use crate::storage::MemoryObjectStore;
    use axum::http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health() {
        let app = test_app(test_state(Arc::new(MemoryObjectStore::new("docs-bucket"))));
        let (status, _, body) = get(app, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["bucket"], "docs-bucket");
    }
}
