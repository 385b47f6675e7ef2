// Fixed-period timer driving Sampler ticks, plus periodic app stats logging.

use super::Sampler;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval, interval_at};
use tracing::Instrument;

/// Sampler, live-stream connection count (for stats logging), and shutdown.
pub struct SamplerTaskDeps {
    pub sampler: Arc<Sampler>,
    pub ws_connections: Arc<AtomicUsize>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Spawns the sampling loop. The first scheduled tick fires one interval from now
/// (call `Sampler::prime` beforehand for an immediate first sample).
/// A slow tick delays the next one; ticks never overlap.
pub fn spawn(deps: SamplerTaskDeps) -> tokio::task::JoinHandle<()> {
    let SamplerTaskDeps {
        sampler,
        ws_connections,
        mut shutdown_rx,
    } = deps;
    let interval_ms = sampler.config().interval_ms;
    let period = Duration::from_millis(interval_ms);
    let stats_log_interval = Duration::from_secs(sampler.config().stats_log_interval_secs);

    let sampler_span = tracing::span!(tracing::Level::DEBUG, "sampler", interval_ms);
    let run = async move {
        let mut tick = interval_at(Instant::now() + period, period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let sample = sampler.tick().await;
                    tracing::trace!(
                        at_ms = sample.taken_at_ms,
                        cpu = ?sample.cpu_usage_percent,
                        "sample recorded"
                    );
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Sampler shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        ws_clients = ws_connections.load(Ordering::Relaxed),
                        window_samples = sampler.samples().len(),
                        rows_saved_total = sampler.rows_saved_total(),
                        rows_pruned_total = sampler.rows_pruned_total(),
                        persist_failures_total = sampler.persist_failures_total(),
                        "app stats"
                    );
                }
            }
        }
    };
    tokio::spawn(run.instrument(sampler_span))
}
