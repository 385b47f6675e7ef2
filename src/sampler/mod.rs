// Sampler: sole owner of mutable telemetry state.
// Ticks run under one async mutex so they never overlap; the live window is published
// as an immutable snapshot so readers never wait on a tick.

mod task;
mod tick;

pub use task::{SamplerTaskDeps, spawn};
pub use tick::{TickOutcome, TickState, compute_tick};

use crate::config::SamplingConfig;
use crate::host_reader::HostReader;
use crate::models::{CompositeSample, HostIdentity};
use crate::rates::now_ms;
use crate::usage_repo::NetworkUsageRepo;
use crate::window::SampleWindow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, broadcast, watch};
use tracing::instrument;

/// Capacity of the per-sample broadcast used by live streams.
const SAMPLE_BROADCAST_CAPACITY: usize = 16;

struct SamplerInner {
    tick_state: TickState,
    window: SampleWindow,
    last_prune_at_ms: Option<i64>,
}

pub struct Sampler {
    reader: Arc<HostReader>,
    repo: Arc<NetworkUsageRepo>,
    config: SamplingConfig,
    inner: Mutex<SamplerInner>,
    window_tx: watch::Sender<Arc<Vec<CompositeSample>>>,
    sample_tx: broadcast::Sender<CompositeSample>,
    rows_saved_total: AtomicU64,
    rows_pruned_total: AtomicU64,
    persist_failures_total: AtomicU64,
}

impl Sampler {
    pub fn new(
        reader: Arc<HostReader>,
        repo: Arc<NetworkUsageRepo>,
        config: SamplingConfig,
    ) -> Self {
        let window = SampleWindow::new(config.window_ms(), config.max_samples());
        let (window_tx, _) = watch::channel(Arc::new(Vec::new()));
        let (sample_tx, _) = broadcast::channel(SAMPLE_BROADCAST_CAPACITY);
        Self {
            reader,
            repo,
            config,
            inner: Mutex::new(SamplerInner {
                tick_state: TickState::default(),
                window,
                last_prune_at_ms: None,
            }),
            window_tx,
            sample_tx,
            rows_saved_total: AtomicU64::new(0),
            rows_pruned_total: AtomicU64::new(0),
            persist_failures_total: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn repo(&self) -> &NetworkUsageRepo {
        &self.repo
    }

    pub fn disk_mount(&self) -> &str {
        self.reader.disk_mount()
    }

    pub fn host_identity(&self) -> HostIdentity {
        self.reader.host_identity()
    }

    /// Startup: take counter baselines, prune unconditionally, then record the first sample.
    pub async fn prime(&self) -> CompositeSample {
        let at_ms = now_ms();
        let mut inner = self.inner.lock().await;
        let baseline = self.reader.read_all().await;
        inner.tick_state = TickState {
            last_cpu: baseline.cpu_times,
            last_network: baseline.network,
        };
        self.prune_locked(&mut inner, at_ms, true).await;
        self.tick_locked(&mut inner, at_ms).await
    }

    /// Scheduled tick, stamped once the state lock is held. The stamp always lands after the
    /// latest published sample so a tick queued behind another never overwrites its row.
    pub async fn tick(&self) -> CompositeSample {
        let mut inner = self.inner.lock().await;
        let at_ms = match inner.window.latest() {
            Some(last) => now_ms().max(last.taken_at_ms + 1),
            None => now_ms(),
        };
        self.tick_locked(&mut inner, at_ms).await
    }

    pub async fn tick_at(&self, at_ms: i64) -> CompositeSample {
        let mut inner = self.inner.lock().await;
        self.tick_locked(&mut inner, at_ms).await
    }

    #[instrument(skip(self, inner), fields(operation = "tick"))]
    async fn tick_locked(&self, inner: &mut SamplerInner, at_ms: i64) -> CompositeSample {
        let readings = self.reader.read_all().await;
        let TickOutcome {
            state,
            sample,
            usage_row,
        } = compute_tick(&inner.tick_state, readings, at_ms);
        inner.tick_state = state;

        inner.window.push(sample.clone(), at_ms);
        self.window_tx.send_replace(Arc::new(inner.window.snapshot()));
        // no live subscribers is normal
        let _ = self.sample_tx.send(sample.clone());

        match self.repo.upsert_sample(&usage_row).await {
            Ok(()) => {
                self.rows_saved_total.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.persist_failures_total.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    error = %e,
                    operation = "upsert_sample",
                    at_ms,
                    "network usage row not persisted"
                );
            }
        }

        self.prune_locked(inner, at_ms, false).await;
        sample
    }

    /// Prunes the retention store unless a prune ran less than `prune_interval_secs` ago.
    /// Returns the number of rows removed when a prune ran.
    pub async fn maybe_prune(&self, now_ms: i64, force: bool) -> Option<u64> {
        let mut inner = self.inner.lock().await;
        self.prune_locked(&mut inner, now_ms, force).await
    }

    async fn prune_locked(
        &self,
        inner: &mut SamplerInner,
        now_ms: i64,
        force: bool,
    ) -> Option<u64> {
        let debounce_ms = (self.config.prune_interval_secs as i64) * 1000;
        if !force
            && inner
                .last_prune_at_ms
                .is_some_and(|last| now_ms - last < debounce_ms)
        {
            return None;
        }
        match self.repo.prune_expired(now_ms).await {
            Ok(n) => {
                inner.last_prune_at_ms = Some(now_ms);
                self.rows_pruned_total.fetch_add(n, Ordering::Relaxed);
                tracing::debug!(operation = "prune_expired", rows = n, "retention prune");
                Some(n)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    operation = "prune_expired",
                    "Failed to prune network usage rows"
                );
                None
            }
        }
    }

    /// Latest sample if it is younger than the configured gap, otherwise an out-of-band tick.
    pub async fn ensure_fresh(&self) -> CompositeSample {
        self.ensure_fresh_at(now_ms(), self.config.fresh_gap_ms).await
    }

    pub async fn ensure_fresh_at(&self, now_ms: i64, min_gap_ms: u64) -> CompositeSample {
        let is_recent = |s: &CompositeSample| now_ms - s.taken_at_ms < min_gap_ms as i64;
        if let Some(latest) = self.latest().filter(&is_recent) {
            return latest;
        }
        let mut inner = self.inner.lock().await;
        // another caller may have ticked while we waited for the lock
        if let Some(latest) = inner.window.latest().filter(|s| is_recent(*s)) {
            return latest.clone();
        }
        self.tick_locked(&mut inner, now_ms).await
    }

    /// Published window contents, oldest first.
    pub fn samples(&self) -> Arc<Vec<CompositeSample>> {
        self.window_tx.borrow().clone()
    }

    pub fn latest(&self) -> Option<CompositeSample> {
        self.window_tx.borrow().last().cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CompositeSample> {
        self.sample_tx.subscribe()
    }

    pub fn watch_window(&self) -> watch::Receiver<Arc<Vec<CompositeSample>>> {
        self.window_tx.subscribe()
    }

    pub fn rows_saved_total(&self) -> u64 {
        self.rows_saved_total.load(Ordering::Relaxed)
    }

    pub fn rows_pruned_total(&self) -> u64 {
        self.rows_pruned_total.load(Ordering::Relaxed)
    }

    pub fn persist_failures_total(&self) -> u64 {
        self.persist_failures_total.load(Ordering::Relaxed)
    }
}
