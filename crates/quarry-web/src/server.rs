use crate::routes::{doc_routes, health_routes};
use crate::{Result, WebError};
use axum::Router;
use quarry_pipeline::Assembler;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub assembler: Arc<Assembler>,
    started: Instant,
}

impl AppState {
    pub fn new(assembler: Arc<Assembler>) -> Self {
        Self {
            assembler,
            started: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(doc_routes())
        .merge(health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_server(listen: &str, assembler: Arc<Assembler>) -> Result<()> {
    let addr: SocketAddr = listen
        .parse()
        .map_err(|e| WebError::Config(format!("Invalid listen address {listen:?}: {e}")))?;
    let app = router(AppState::new(assembler));

    tracing::info!("Starting quarry on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(WebError::Io)?;
    axum::serve(listener, app).await.map_err(WebError::Io)?;

    Ok(())
}
