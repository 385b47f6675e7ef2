// Response shape of the live metrics endpoint.

use serde::{Deserialize, Serialize};

/// avg/min/max over the live window; all None when no value was available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuReport {
    pub usage_percent: Option<f64>,
    pub cores: usize,
    pub model: Option<String>,
    pub load_avg: [f64; 3],
    pub window: WindowStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermalReport {
    pub cpu_temp_c: Option<f64>,
    pub window: WindowStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryReport {
    pub usage_percent: Option<f64>,
    pub used_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub available_bytes: Option<u64>,
    pub window: WindowStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskReport {
    pub mount_path: String,
    pub usage_percent: Option<f64>,
    pub used_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub free_bytes: Option<u64>,
    pub window: WindowStats,
}

/// Compact per-sample point for the live chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplePoint {
    pub ts: String,
    pub cpu_usage_percent: Option<f64>,
    pub cpu_temp_c: Option<f64>,
    pub memory_usage_percent: Option<f64>,
    pub disk_usage_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub window_ms: i64,
    pub interval_ms: u64,
    pub sampled_at: String,
    pub cpu: CpuReport,
    pub thermal: ThermalReport,
    pub memory: MemoryReport,
    pub disk: DiskReport,
    pub samples: Vec<SamplePoint>,
}
