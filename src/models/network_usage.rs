// Persisted network usage rows and the summary built from them.

use serde::{Deserialize, Serialize};

/// One persisted row per tick, keyed by `at_ms`.
/// Deltas are None when they cannot be trusted (first sample, counter regression).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkUsageRow {
    pub at_ms: i64,
    pub taken_at_iso: String,
    pub inbound_bytes_total: Option<u64>,
    pub outbound_bytes_total: Option<u64>,
    pub inbound_bytes_delta: Option<u64>,
    pub outbound_bytes_delta: Option<u64>,
}

/// Aggregate over the retention horizon (one SQL pass).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageTotals {
    pub sample_count: u64,
    pub first_at_ms: Option<i64>,
    pub last_at_ms: Option<i64>,
    pub inbound_bytes: u64,
    pub outbound_bytes: u64,
}

/// Per-tick deltas used for the current rate and the recent chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageDeltaPoint {
    pub at_ms: i64,
    pub inbound_bytes_delta: Option<u64>,
    pub outbound_bytes_delta: Option<u64>,
}

/// Everything the usage summary reads from the store, taken from one consistent view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub totals: UsageTotals,
    pub daily: Vec<DailyUsage>,
    pub latest: Option<UsageDeltaPoint>,
    pub recent: Vec<UsageDeltaPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    /// Calendar day (UTC), `YYYY-MM-DD`.
    pub day: String,
    pub sample_count: u64,
    pub inbound_bytes: u64,
    pub outbound_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteTotals {
    pub inbound_bytes: u64,
    pub outbound_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRate {
    pub sampled_at: Option<String>,
    pub inbound_bps: Option<f64>,
    pub outbound_bps: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatePoint {
    pub ts: String,
    pub inbound_bps: Option<f64>,
    pub outbound_bps: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkUsageSummary {
    pub retention_ms: i64,
    pub interval_ms: u64,
    pub started_at: String,
    pub sample_count: u64,
    pub expected_samples: u64,
    pub coverage_percent: f64,
    pub first_sample_at: Option<String>,
    pub last_sample_at: Option<String>,
    pub totals: ByteTotals,
    pub current: CurrentRate,
    pub daily: Vec<DailyUsage>,
    pub recent: Vec<RatePoint>,
}
