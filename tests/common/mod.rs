// Shared test helpers: a fake procfs/sysfs tree and a temp-backed store

#![allow(dead_code)]

use hostwatch::config::{HostConfig, SamplingConfig};
use hostwatch::models::{CompositeSample, NetworkUsageRow};
use hostwatch::rates::iso_millis;
use hostwatch::usage_repo::NetworkUsageRepo;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const NET_DEV_HEADER: &str = "Inter-|   Receive                                                |  Transmit\n \
face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n";

/// Temp directory laid out like `/proc` + `/sys`, with nothing in it until written.
pub struct HostFixture {
    pub dir: TempDir,
}

impl HostFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("proc/net")).unwrap();
        std::fs::create_dir_all(dir.path().join("sys/class/thermal")).unwrap();
        Self { dir }
    }

    pub fn proc_root(&self) -> PathBuf {
        self.dir.path().join("proc")
    }

    pub fn sys_root(&self) -> PathBuf {
        self.dir.path().join("sys")
    }

    /// Host config reading only from this fixture (no sysinfo fallback).
    pub fn host_config(&self) -> HostConfig {
        HostConfig {
            proc_root: self.proc_root(),
            sys_root: self.sys_root(),
            disk_mount: "/".into(),
            platform_fallback: false,
        }
    }

    /// One core line: user nice system idle iowait irq softirq steal.
    pub fn write_cpu(&self, busy: u64, idle: u64) {
        let content = format!(
            "cpu  {busy} 0 0 {idle} 0 0 0 0 0 0\ncpu0 {busy} 0 0 {idle} 0 0 0 0 0 0\nintr 12345\nctxt 678\n"
        );
        write(&self.proc_root().join("stat"), &content);
    }

    pub fn write_meminfo(&self, total_kb: u64, available_kb: u64) {
        let content = format!(
            "MemTotal:       {total_kb} kB\nMemFree:        1024 kB\nMemAvailable:   {available_kb} kB\nBuffers:        512 kB\n"
        );
        write(&self.proc_root().join("meminfo"), &content);
    }

    /// Loopback traffic is always present and must be ignored.
    pub fn write_net(&self, rx: u64, tx: u64) {
        let content = format!(
            "{NET_DEV_HEADER}    lo: 999999 10 0 0 0 0 0 0 999999 10 0 0 0 0 0 0\n  eth0: {rx} 10 0 0 0 0 0 0 {tx} 20 0 0 0 0 0 0\n"
        );
        write(&self.proc_root().join("net/dev"), &content);
    }

    pub fn write_thermal_zone(&self, index: usize, kind: &str, millidegrees: i64) {
        let zone = self
            .sys_root()
            .join(format!("class/thermal/thermal_zone{index}"));
        std::fs::create_dir_all(&zone).unwrap();
        write(&zone.join("type"), &format!("{kind}\n"));
        write(&zone.join("temp"), &format!("{millidegrees}\n"));
    }

    /// `hwmon<index>/name` plus `temp1_input`; `temp1_label` only when a label is given.
    pub fn write_hwmon(&self, index: usize, chip: &str, label: Option<&str>, millidegrees: i64) {
        let dir = self.sys_root().join(format!("class/hwmon/hwmon{index}"));
        std::fs::create_dir_all(&dir).unwrap();
        write(&dir.join("name"), &format!("{chip}\n"));
        write(&dir.join("temp1_input"), &format!("{millidegrees}\n"));
        if let Some(label) = label {
            write(&dir.join("temp1_label"), &format!("{label}\n"));
        }
    }

    pub fn write_cpuinfo(&self, model: &str) {
        let content = format!("processor\t: 0\nvendor_id\t: GenuineIntel\nmodel name\t: {model}\n");
        write(&self.proc_root().join("cpuinfo"), &content);
    }
}

fn write(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
}

pub async fn temp_repo(dir: &TempDir, retention_days: u32) -> NetworkUsageRepo {
    let path = dir.path().join("usage.db");
    let repo = NetworkUsageRepo::connect(path.to_str().unwrap(), retention_days, 2)
        .await
        .unwrap();
    repo.init().await.unwrap();
    repo
}

pub fn usage_row(at_ms: i64, inbound: Option<u64>, outbound: Option<u64>) -> NetworkUsageRow {
    NetworkUsageRow {
        at_ms,
        taken_at_iso: iso_millis(at_ms),
        inbound_bytes_total: Some(1_000_000),
        outbound_bytes_total: Some(2_000_000),
        inbound_bytes_delta: inbound,
        outbound_bytes_delta: outbound,
    }
}

pub fn sampling_config() -> SamplingConfig {
    SamplingConfig {
        interval_ms: 5_000,
        window_secs: 300,
        ..SamplingConfig::default()
    }
}

pub fn sample(at_ms: i64, cpu: Option<f64>) -> CompositeSample {
    CompositeSample {
        taken_at_ms: at_ms,
        cpu_usage_percent: cpu,
        cpu_temp_c: None,
        memory_usage_percent: None,
        memory_used_bytes: None,
        memory_total_bytes: None,
        disk_usage_percent: None,
        disk_used_bytes: None,
        disk_total_bytes: None,
    }
}
