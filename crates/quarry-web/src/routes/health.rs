//! Health check endpoint

use crate::server::AppState;
use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime": state.uptime().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
