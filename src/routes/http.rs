// GET handlers: version, live metrics, network usage

use axum::{Json, extract::State, response::IntoResponse};

use super::{ApiError, AppState};
use crate::models::{MetricsReport, NetworkUsageSummary};
use crate::rates::now_ms;
use crate::summary;

/// GET /version — service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/system/metrics — latest sample (refreshed if stale), window stats, chart points.
pub(super) async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsReport> {
    let sampler = &state.sampler;
    let latest = sampler.ensure_fresh().await;
    let samples = sampler.samples();
    let identity = sampler.host_identity();
    Json(summary::metrics_report(
        &latest,
        &samples,
        identity,
        sampler.disk_mount(),
        sampler.config(),
        now_ms(),
    ))
}

/// GET /api/system/network-usage — retention-horizon totals, daily rollup, current/recent rates.
pub(super) async fn network_usage_handler(
    State(state): State<AppState>,
) -> Result<Json<NetworkUsageSummary>, ApiError> {
    let sampler = &state.sampler;
    let summary =
        summary::network_usage_summary(sampler.repo(), sampler.config(), now_ms()).await?;
    Ok(Json(summary))
}
