use std::{sync::Arc, time::Duration};

use axum::Router;
use configs::{AppConfig, ServerConfig};
use store::KvStore;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Assemble the router for an already-built store.
pub fn build_app(store: Arc<dyn KvStore>, server: &ServerConfig) -> Router {
    let timeout = Duration::from_secs(server.request_timeout_secs);
    routes::build_router(AppState::new(store), build_cors(), timeout)
}

/// Public entry: build the configured store and serve until the listener fails.
pub async fn run_with(cfg: AppConfig) -> anyhow::Result<()> {
    let store = store::build_store(&cfg.store);
    let app = build_app(store, &cfg.server);

    // Bind and serve
    let addr = cfg.server.bind_addr()?;
    info!(%addr, versions = ?routes::API_VERSIONS, "starting kv server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
