use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use doc_manager::{
    config::Config,
    routes::create_router,
    search::{DisabledIndex, IndexError, KendraIndex, SearchIndex},
    storage::S3Store,
    utils::init_logger,
    AppState,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;
    let _log_guard = init_logger(config.server.log_dir.as_deref());
    info!("Configuration loaded: {:?}", config.server);

    let store = S3Store::new(&config.storage).context("Failed to set up S3 store")?;

    let index: Arc<dyn SearchIndex> = match KendraIndex::from_config(&config.index).await {
        Ok(index) => Arc::new(index),
        Err(IndexError::NotConfigured) => {
            warn!("KENDRA_INDEX_ID / KENDRA_DATA_SOURCE_ID not set, sync endpoints disabled");
            Arc::new(DisabledIndex)
        }
        Err(e) => return Err(e).context("Failed to set up search index"),
    };

    // Create shared state
    let state = AppState {
        config: config.clone(),
        store: Arc::new(store),
        index,
    };

    let app = create_router(state);

    // Start server
    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .context("HOST must be an IP address")?;
    let addr = SocketAddr::from((host, config.server.port));
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
