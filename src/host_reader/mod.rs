// Host metric readers: procfs/sysfs first, sysinfo where procfs is unavailable.
// Every reader degrades to None; none of them returns an error to the sampler.

mod linux;
pub mod thermal;

use crate::config::HostConfig;
use crate::models::{
    CpuTimesSnapshot, DiskSnapshot, HostIdentity, HostReadings, MemorySnapshot, NetworkIoSnapshot,
};
use crate::rates::{clamp_percent, round1};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use sysinfo::{CpuRefreshKind, Disks, Networks, System};
use tracing::instrument;

pub struct HostReader {
    proc_root: PathBuf,
    sys_root: PathBuf,
    disk_mount: String,
    platform_fallback: bool,
    sys: Arc<Mutex<System>>,
    disks: Arc<Mutex<Disks>>,
    networks: Arc<Mutex<Networks>>,
}

impl Default for HostReader {
    fn default() -> Self {
        Self::new(&HostConfig::default())
    }
}

impl HostReader {
    pub fn new(config: &HostConfig) -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_list(CpuRefreshKind::nothing());
        Self {
            proc_root: config.proc_root.clone(),
            sys_root: config.sys_root.clone(),
            disk_mount: config.disk_mount.clone(),
            platform_fallback: config.platform_fallback,
            sys: Arc::new(Mutex::new(sys)),
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
        }
    }

    pub fn disk_mount(&self) -> &str {
        &self.disk_mount
    }

    pub fn read_cpu_times(&self) -> Option<CpuTimesSnapshot> {
        let content = std::fs::read_to_string(self.proc_root.join("stat")).ok()?;
        linux::parse_proc_stat(&content)
    }

    pub fn read_memory(&self) -> Option<MemorySnapshot> {
        let from_proc = std::fs::read_to_string(self.proc_root.join("meminfo"))
            .ok()
            .and_then(|c| linux::parse_meminfo(&c));
        let (total, available) = match from_proc {
            Some(pair) => pair,
            None if self.platform_fallback => {
                let mut sys = self.sys.lock().ok()?;
                sys.refresh_memory();
                (sys.total_memory(), sys.available_memory())
            }
            None => return None,
        };
        memory_snapshot(total, available)
    }

    pub fn read_disk(&self, mount: &str) -> Option<DiskSnapshot> {
        let mut disks = self.disks.lock().ok()?;
        disks.refresh(false);
        let target = Path::new(mount);
        let disk = disks
            .list()
            .iter()
            .filter(|d| target.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())?;
        Some(disk_snapshot(mount, disk.total_space(), disk.available_space()))
    }

    pub fn read_cpu_temp_c(&self) -> Option<f64> {
        thermal::select_cpu_temp(&thermal::scan_candidates(&self.sys_root))
    }

    pub fn read_network(&self) -> Option<NetworkIoSnapshot> {
        match std::fs::read_to_string(self.proc_root.join("net/dev")) {
            Ok(content) => linux::parse_proc_net_dev(&content),
            Err(_) if self.platform_fallback => self.read_network_sysinfo(),
            Err(_) => None,
        }
    }

    fn read_network_sysinfo(&self) -> Option<NetworkIoSnapshot> {
        let mut networks = self.networks.lock().ok()?;
        networks.refresh(true);
        let (rx_bytes, tx_bytes) = networks
            .list()
            .iter()
            .filter(|(name, _)| !is_loopback(name))
            .fold((0u64, 0u64), |(rx, tx), (_, data)| {
                (
                    rx.saturating_add(data.total_received()),
                    tx.saturating_add(data.total_transmitted()),
                )
            });
        if rx_bytes == 0 && tx_bytes == 0 {
            return None;
        }
        Some(NetworkIoSnapshot { rx_bytes, tx_bytes })
    }

    /// All readers for one tick, synchronously.
    pub fn read_all_blocking(&self) -> HostReadings {
        HostReadings {
            cpu_times: self.read_cpu_times(),
            memory: self.read_memory(),
            disk: self.read_disk(&self.disk_mount),
            cpu_temp_c: self.read_cpu_temp_c(),
            network: self.read_network(),
        }
    }

    /// All readers for one tick, off the async runtime.
    #[instrument(skip(self), fields(reader = "host", operation = "read_all"))]
    pub async fn read_all(self: &Arc<Self>) -> HostReadings {
        let reader = Arc::clone(self);
        match tokio::task::spawn_blocking(move || reader.read_all_blocking()).await {
            Ok(readings) => readings,
            Err(e) => {
                tracing::warn!(error = %e, operation = "read_all", "host reader task failed");
                HostReadings::default()
            }
        }
    }

    pub fn host_identity(&self) -> HostIdentity {
        let load = System::load_average();
        let (cores, brand) = match self.sys.lock() {
            Ok(sys) => (
                sys.cpus().len(),
                sys.cpus()
                    .first()
                    .map(|c| c.brand().trim().to_string())
                    .filter(|s| !s.is_empty()),
            ),
            Err(_) => (0, None),
        };
        HostIdentity {
            cores,
            model: linux::read_cpu_model(&self.proc_root).or(brand),
            load_avg: [round1(load.one), round1(load.five), round1(load.fifteen)],
        }
    }
}

fn is_loopback(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0") || name.eq_ignore_ascii_case("loopback")
}

/// Bound available to [0, total] before deriving used bytes.
pub fn memory_snapshot(total: u64, available: u64) -> Option<MemorySnapshot> {
    if total == 0 {
        return None;
    }
    let available = available.min(total);
    let used = total - available;
    Some(MemorySnapshot {
        total_bytes: total,
        available_bytes: available,
        used_bytes: used,
        usage_percent: round1(clamp_percent(used as f64 / total as f64 * 100.0)),
    })
}

/// Bound free to [0, total]; usage is unknown for a zero-capacity filesystem.
pub fn disk_snapshot(mount: &str, total: u64, free: u64) -> DiskSnapshot {
    if total == 0 {
        return DiskSnapshot {
            mount_path: mount.to_string(),
            total_bytes: 0,
            free_bytes: 0,
            used_bytes: 0,
            usage_percent: None,
        };
    }
    let free = free.min(total);
    let used = total - free;
    DiskSnapshot {
        mount_path: mount.to_string(),
        total_bytes: total,
        free_bytes: free,
        used_bytes: used,
        usage_percent: Some(round1(clamp_percent(used as f64 / total as f64 * 100.0))),
    }
}
