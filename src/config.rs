use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub host: HostConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_max_pool_size() -> u32 {
    4
}

fn default_retention_days() -> u32 {
    30
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub interval_ms: u64,
    /// Span of the live in-memory window.
    pub window_secs: u64,
    /// Hard cap on buffered samples; derived from window and interval when unset.
    pub max_samples: Option<usize>,
    /// Minimum time between two retention prunes.
    pub prune_interval_secs: u64,
    /// ensure-fresh returns the cached sample when it is younger than this.
    pub fresh_gap_ms: u64,
    /// Latest persisted row is "current" only within factor x interval.
    pub freshness_factor: u32,
    /// How often to log app stats at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            window_secs: 5 * 60,
            max_samples: None,
            prune_interval_secs: 5 * 60,
            fresh_gap_ms: 1_200,
            freshness_factor: 3,
            stats_log_interval_secs: 60,
        }
    }
}

impl SamplingConfig {
    pub fn window_ms(&self) -> i64 {
        (self.window_secs as i64) * 1000
    }

    /// ceil(window / interval) plus a little slack for jittered ticks.
    pub fn max_samples(&self) -> usize {
        self.max_samples.unwrap_or_else(|| {
            let window_ms = self.window_secs * 1000;
            window_ms.div_ceil(self.interval_ms.max(1)) as usize + 8
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
    /// Mount whose usage is reported as "disk".
    pub disk_mount: String,
    /// Use sysinfo when a procfs source is missing (non-Linux hosts, containers).
    pub platform_fallback: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            disk_mount: "/".into(),
            platform_fallback: true,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.database.retention_days > 0,
            "database.retention_days must be > 0, got {}",
            self.database.retention_days
        );
        anyhow::ensure!(
            self.sampling.interval_ms > 0,
            "sampling.interval_ms must be > 0, got {}",
            self.sampling.interval_ms
        );
        anyhow::ensure!(
            self.sampling.window_secs * 1000 >= self.sampling.interval_ms,
            "sampling.window_secs must cover at least one interval, got {}",
            self.sampling.window_secs
        );
        if let Some(max) = self.sampling.max_samples {
            anyhow::ensure!(max > 0, "sampling.max_samples must be > 0, got {}", max);
        }
        anyhow::ensure!(
            self.sampling.prune_interval_secs > 0,
            "sampling.prune_interval_secs must be > 0, got {}",
            self.sampling.prune_interval_secs
        );
        anyhow::ensure!(
            self.sampling.freshness_factor > 0,
            "sampling.freshness_factor must be > 0, got {}",
            self.sampling.freshness_factor
        );
        anyhow::ensure!(
            self.sampling.stats_log_interval_secs > 0,
            "sampling.stats_log_interval_secs must be > 0, got {}",
            self.sampling.stats_log_interval_secs
        );
        anyhow::ensure!(
            !self.host.disk_mount.is_empty(),
            "host.disk_mount must be non-empty"
        );
        Ok(())
    }
}
