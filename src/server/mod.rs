use axum::{
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{PagesmithError, PagesmithResult};
use crate::store::version::VersionStore;

pub mod versions;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VersionStore>,
    pub api_token: Option<String>,
}

/// Routes of the reference version store.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/sites/:site/versions",
            get(versions::list_versions).post(versions::append_version),
        )
        .route("/sites/:site/versions/head", get(versions::get_head))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn run_http_server(config: ServerConfig, store: Arc<dyn VersionStore>) -> PagesmithResult<()> {
    let state = AppState {
        store,
        api_token: config.api_token.clone(),
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|err| PagesmithError::ConfigError(format!("invalid server address: {err}")))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| PagesmithError::Internal(format!("failed to bind server: {err}")))?;

    info!(%addr, "version store listening");
    serve(listener, state).await
}

/// Serve on an already bound listener.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> PagesmithResult<()> {
    axum::serve(listener, router(state))
        .await
        .map_err(|err| PagesmithError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
