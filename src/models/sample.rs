// Live host readings: one composite sample per tick plus the raw snapshots it is built from.

use serde::{Deserialize, Serialize};

/// One tick's worth of host metrics. `None` means the source was unavailable for that tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeSample {
    pub taken_at_ms: i64,
    pub cpu_usage_percent: Option<f64>,
    pub cpu_temp_c: Option<f64>,
    pub memory_usage_percent: Option<f64>,
    pub memory_used_bytes: Option<u64>,
    pub memory_total_bytes: Option<u64>,
    pub disk_usage_percent: Option<f64>,
    pub disk_used_bytes: Option<u64>,
    pub disk_total_bytes: Option<u64>,
}

/// Cumulative CPU tick counters summed over all logical cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimesSnapshot {
    pub idle_ticks: u64,
    pub total_ticks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskSnapshot {
    pub mount_path: String,
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_bytes: u64,
    /// None when the filesystem reports zero capacity.
    pub usage_percent: Option<f64>,
}

/// Cumulative byte counters summed over non-loopback interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkIoSnapshot {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Everything the readers produced for a single tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostReadings {
    pub cpu_times: Option<CpuTimesSnapshot>,
    pub memory: Option<MemorySnapshot>,
    pub disk: Option<DiskSnapshot>,
    pub cpu_temp_c: Option<f64>,
    pub network: Option<NetworkIoSnapshot>,
}

/// Static-ish host facts shown next to the live metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostIdentity {
    pub cores: usize,
    pub model: Option<String>,
    pub load_avg: [f64; 3],
}
