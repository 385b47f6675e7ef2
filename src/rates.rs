// Delta/rate engine: turns pairs of cumulative counter snapshots into percentages and byte rates.

use crate::models::{CpuTimesSnapshot, NetworkIoSnapshot};
use chrono::{DateTime, SecondsFormat, Utc};

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Busy share of the ticks elapsed between two CPU snapshots.
/// None when no ticks elapsed (or the counters went backwards).
pub fn cpu_usage_percent(prev: &CpuTimesSnapshot, cur: &CpuTimesSnapshot) -> Option<f64> {
    let total_delta = cur.total_ticks as i128 - prev.total_ticks as i128;
    if total_delta <= 0 {
        return None;
    }
    let idle_delta = cur.idle_ticks as i128 - prev.idle_ticks as i128;
    let busy = (total_delta - idle_delta) as f64 / total_delta as f64 * 100.0;
    Some(round1(clamp_percent(busy)))
}

/// Difference of a monotonically increasing counter. None on first reading or regression.
pub fn counter_delta(prev: Option<u64>, cur: u64) -> Option<u64> {
    cur.checked_sub(prev?)
}

/// Inbound and outbound deltas between two network snapshots, independently.
pub fn network_deltas(
    prev: Option<&NetworkIoSnapshot>,
    cur: Option<&NetworkIoSnapshot>,
) -> (Option<u64>, Option<u64>) {
    let Some(cur) = cur else {
        return (None, None);
    };
    (
        counter_delta(prev.map(|p| p.rx_bytes), cur.rx_bytes),
        counter_delta(prev.map(|p| p.tx_bytes), cur.tx_bytes),
    )
}

/// Bytes per second over the fixed sampling interval.
pub fn rate_bps(delta: Option<u64>, interval_ms: u64) -> Option<f64> {
    let delta = delta?;
    if interval_ms == 0 {
        return None;
    }
    let interval_secs = interval_ms as f64 / 1000.0;
    Some(round1(delta as f64 / interval_secs))
}

/// A persisted sample is "current" only if it is no older than `factor` sampling intervals.
pub fn is_fresh(latest_at_ms: Option<i64>, now_ms: i64, interval_ms: u64, factor: u32) -> bool {
    match latest_at_ms {
        Some(at) => now_ms - at <= (interval_ms as i64) * (factor as i64),
        None => false,
    }
}

/// Wall clock in Unix milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// UTC RFC 3339 with millisecond precision, e.g. `2026-10-19T08:30:00.000Z`.
pub fn iso_millis(at_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(at_ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
