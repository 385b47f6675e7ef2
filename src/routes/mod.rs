// HTTP + WebSocket routes (read-only; caller identity is checked upstream)

mod error;
mod http;
mod ws;

pub use error::ApiError;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tower_http::cors::{Any, CorsLayer};

use crate::sampler::Sampler;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) sampler: Arc<Sampler>,
    pub(crate) ws_connections: Arc<AtomicUsize>,
}

pub fn app(sampler: Arc<Sampler>, ws_connections: Arc<AtomicUsize>) -> Router {
    let state = AppState {
        sampler,
        ws_connections,
    };
    Router::new()
        .route("/", get(|| async { "hostwatch: host telemetry" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/system/metrics", get(http::metrics_handler)) // GET /api/system/metrics
        .route("/api/system/network-usage", get(http::network_usage_handler)) // GET /api/system/network-usage
        .route("/api/system/usage", get(http::network_usage_handler)) // GET /api/system/usage
        .route("/ws/samples", get(ws::ws_samples)) // WS /ws/samples
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
