// Query/aggregation layer: read-only summaries over the live window and the retention store.
// Nothing here mutates sampler state.

use crate::config::SamplingConfig;
use crate::models::{
    ByteTotals, CompositeSample, CpuReport, CurrentRate, DiskReport, HostIdentity, MemoryReport,
    MetricsReport, NetworkUsageSummary, RatePoint, SamplePoint, ThermalReport, UsageSnapshot,
    WindowStats,
};
use crate::rates::{clamp_percent, is_fresh, iso_millis, rate_bps, round1};
use crate::usage_repo::NetworkUsageRepo;
use tracing::instrument;

/// avg/min/max ignoring missing values; all None when nothing was available.
pub fn summarize_window<I>(values: I) -> WindowStats
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.into_iter().flatten() {
        count += 1;
        sum += v;
        min = min.min(v);
        max = max.max(v);
    }
    if count == 0 {
        return WindowStats::default();
    }
    WindowStats {
        avg: Some(round1(sum / count as f64)),
        min: Some(round1(min)),
        max: Some(round1(max)),
    }
}

/// Samples the retention horizon should hold at one per interval.
pub fn expected_samples(retention_ms: i64, interval_ms: u64) -> u64 {
    if retention_ms <= 0 || interval_ms == 0 {
        return 0;
    }
    retention_ms as u64 / interval_ms
}

/// min(100, 100 x count / expected); 0 when nothing is expected.
pub fn coverage_percent(sample_count: u64, expected: u64) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    round1(clamp_percent(sample_count as f64 / expected as f64 * 100.0))
}

/// Live metrics response: latest sample, per-metric window stats and the chart points.
/// `samples` is restricted to the window ending at `now_ms`.
pub fn metrics_report(
    latest: &CompositeSample,
    samples: &[CompositeSample],
    identity: HostIdentity,
    disk_mount: &str,
    config: &SamplingConfig,
    now_ms: i64,
) -> MetricsReport {
    let cutoff = now_ms - config.window_ms();
    let in_window: Vec<&CompositeSample> =
        samples.iter().filter(|s| s.taken_at_ms >= cutoff).collect();

    let cpu_window = summarize_window(in_window.iter().map(|s| s.cpu_usage_percent));
    let thermal_window = summarize_window(in_window.iter().map(|s| s.cpu_temp_c));
    let memory_window = summarize_window(in_window.iter().map(|s| s.memory_usage_percent));
    let disk_window = summarize_window(in_window.iter().map(|s| s.disk_usage_percent));

    MetricsReport {
        window_ms: config.window_ms(),
        interval_ms: config.interval_ms,
        sampled_at: iso_millis(latest.taken_at_ms),
        cpu: CpuReport {
            usage_percent: latest.cpu_usage_percent,
            cores: identity.cores,
            model: identity.model,
            load_avg: identity.load_avg,
            window: cpu_window,
        },
        thermal: ThermalReport {
            cpu_temp_c: latest.cpu_temp_c,
            window: thermal_window,
        },
        memory: MemoryReport {
            usage_percent: latest.memory_usage_percent,
            used_bytes: latest.memory_used_bytes,
            total_bytes: latest.memory_total_bytes,
            available_bytes: latest
                .memory_total_bytes
                .zip(latest.memory_used_bytes)
                .map(|(total, used)| total.saturating_sub(used)),
            window: memory_window,
        },
        disk: DiskReport {
            mount_path: disk_mount.to_string(),
            usage_percent: latest.disk_usage_percent,
            used_bytes: latest.disk_used_bytes,
            total_bytes: latest.disk_total_bytes,
            free_bytes: latest
                .disk_total_bytes
                .zip(latest.disk_used_bytes)
                .map(|(total, used)| total.saturating_sub(used)),
            window: disk_window,
        },
        samples: in_window
            .iter()
            .map(|s| SamplePoint {
                ts: iso_millis(s.taken_at_ms),
                cpu_usage_percent: s.cpu_usage_percent,
                cpu_temp_c: s.cpu_temp_c,
                memory_usage_percent: s.memory_usage_percent,
                disk_usage_percent: s.disk_usage_percent,
            })
            .collect(),
    }
}

/// Network usage over the retention horizon ending at `now_ms`.
#[instrument(skip(repo, config), fields(operation = "network_usage_summary"))]
pub async fn network_usage_summary(
    repo: &NetworkUsageRepo,
    config: &SamplingConfig,
    now_ms: i64,
) -> anyhow::Result<NetworkUsageSummary> {
    let retention_ms = repo.retention_ms();
    let cutoff = now_ms - retention_ms;
    let recent_cutoff = now_ms - config.window_ms();

    let UsageSnapshot {
        totals,
        daily,
        latest,
        recent,
    } = repo.usage_snapshot(cutoff, recent_cutoff).await?;

    let expected = expected_samples(retention_ms, config.interval_ms);
    let latest_at = latest.map(|l| l.at_ms);
    let fresh = is_fresh(latest_at, now_ms, config.interval_ms, config.freshness_factor);
    let current_rate = |delta: Option<u64>| {
        if fresh {
            rate_bps(delta, config.interval_ms)
        } else {
            None
        }
    };

    Ok(NetworkUsageSummary {
        retention_ms,
        interval_ms: config.interval_ms,
        started_at: iso_millis(cutoff),
        sample_count: totals.sample_count,
        expected_samples: expected,
        coverage_percent: coverage_percent(totals.sample_count, expected),
        first_sample_at: totals.first_at_ms.map(iso_millis),
        last_sample_at: totals.last_at_ms.map(iso_millis),
        totals: ByteTotals {
            inbound_bytes: totals.inbound_bytes,
            outbound_bytes: totals.outbound_bytes,
        },
        current: CurrentRate {
            sampled_at: latest_at.map(iso_millis),
            inbound_bps: current_rate(latest.and_then(|l| l.inbound_bytes_delta)),
            outbound_bps: current_rate(latest.and_then(|l| l.outbound_bytes_delta)),
        },
        daily,
        recent: recent
            .iter()
            .map(|p| RatePoint {
                ts: iso_millis(p.at_ms),
                inbound_bps: rate_bps(p.inbound_bytes_delta, config.interval_ms),
                outbound_bps: rate_bps(p.outbound_bytes_delta, config.interval_ms),
            })
            .collect(),
    })
}
