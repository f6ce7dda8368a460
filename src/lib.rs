// Doc Manager - document management for a knowledge-base chatbot

pub mod config;
pub mod console;   // Headless admin console driving the HTTP API
pub mod folders;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod search;    // Search index sync (Kendra)
pub mod storage;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
