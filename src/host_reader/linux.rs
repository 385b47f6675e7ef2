// procfs parsers: /proc/stat, /proc/meminfo, /proc/net/dev, /proc/cpuinfo.
// Parsers take file contents so they can be exercised without a live procfs.

use crate::models::{CpuTimesSnapshot, NetworkIoSnapshot};
use std::path::Path;

/// Sum idle and total ticks over per-core `cpuN` lines; use the aggregate `cpu` line
/// when the kernel exposes no per-core rows.
pub(super) fn parse_proc_stat(content: &str) -> Option<CpuTimesSnapshot> {
    let mut per_core: Option<CpuTimesSnapshot> = None;
    let mut aggregate: Option<CpuTimesSnapshot> = None;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let Some(label) = parts.next() else {
            continue;
        };
        let Some(suffix) = label.strip_prefix("cpu") else {
            continue;
        };
        let fields: Vec<u64> = parts.take(8).filter_map(|f| f.parse().ok()).collect();
        if fields.len() < 4 {
            continue;
        }
        // user nice system idle iowait irq softirq steal
        let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
        let total: u64 = fields.iter().sum();
        let times = CpuTimesSnapshot {
            idle_ticks: idle,
            total_ticks: total,
        };
        if suffix.is_empty() {
            aggregate = Some(times);
        } else if suffix.chars().all(|c| c.is_ascii_digit()) {
            let acc = per_core.get_or_insert(CpuTimesSnapshot {
                idle_ticks: 0,
                total_ticks: 0,
            });
            acc.idle_ticks += times.idle_ticks;
            acc.total_ticks += times.total_ticks;
        }
    }

    per_core.or(aggregate)
}

/// `(MemTotal, MemAvailable)` in bytes. None unless both are present and total > 0.
pub(super) fn parse_meminfo(content: &str) -> Option<(u64, u64)> {
    let mut total_kb: Option<u64> = None;
    let mut available_kb: Option<u64> = None;
    for line in content.lines() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("MemTotal:") => total_kb = parts.next().and_then(|v| v.parse().ok()),
            Some("MemAvailable:") => available_kb = parts.next().and_then(|v| v.parse().ok()),
            _ => {}
        }
    }
    let total = total_kb?.checked_mul(1024)?;
    let available = available_kb?.saturating_mul(1024);
    if total == 0 {
        return None;
    }
    Some((total, available))
}

/// Sum rx/tx bytes over non-loopback interfaces. None when nothing meaningful was counted.
pub(super) fn parse_proc_net_dev(content: &str) -> Option<NetworkIoSnapshot> {
    let mut rx_bytes: u64 = 0;
    let mut tx_bytes: u64 = 0;

    for line in content.lines().skip(2) {
        let Some((iface, stats)) = line.trim().split_once(':') else {
            continue;
        };
        let iface = iface.trim();
        if iface.is_empty() || iface == "lo" {
            continue;
        }
        let fields: Vec<&str> = stats.split_whitespace().collect();
        if fields.len() < 16 {
            continue;
        }
        let (Ok(rx), Ok(tx)) = (fields[0].parse::<u64>(), fields[8].parse::<u64>()) else {
            continue;
        };
        rx_bytes = rx_bytes.saturating_add(rx);
        tx_bytes = tx_bytes.saturating_add(tx);
    }

    if rx_bytes == 0 && tx_bytes == 0 {
        return None;
    }
    Some(NetworkIoSnapshot { rx_bytes, tx_bytes })
}

/// First "model name" from /proc/cpuinfo.
pub(super) fn read_cpu_model(proc_root: &Path) -> Option<String> {
    let content = std::fs::read_to_string(proc_root.join("cpuinfo")).ok()?;
    for line in content.lines() {
        if line.starts_with("model name") {
            let name = line
                .find(':')
                .map(|i| line[i + 1..].trim())
                .filter(|s| !s.is_empty() && *s != "cpu0")?;
            return Some(name.to_string());
        }
    }
    None
}
