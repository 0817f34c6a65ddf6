//! Sweep configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::window;

/// Default path of the `tsdb` launcher script.
pub const DEFAULT_TSD_PATH: &str = "/usr/share/opentsdb/bin/tsdb";
/// Default path of the TSD configuration file.
pub const DEFAULT_CFG_PATH: &str = "/etc/opentsdb/opentsdb.conf";
/// Default progress file location.
pub const DEFAULT_STORE_PATH: &str = "/var/lib/tsdb-sweep/repaired.txt";
/// Default identity used with `--use-sudo`.
pub const DEFAULT_SUDO_USER: &str = "opentsdb";
/// Aggregator keyword passed to `fsck` when none is configured.
pub const DEFAULT_AGGREGATOR: &str = "sum";

/// Configuration for one sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Hours of history to sweep, counted back from now.
    pub time_range_hours: u32,
    /// Width of each repair window in minutes. Must divide 60.
    pub chunk_minutes: u32,
    /// Extra attempts per chunk beyond the first.
    pub retries: u32,
    pub tsd_path: PathBuf,
    pub cfg_path: PathBuf,
    pub store_path: PathBuf,
    pub use_sudo: bool,
    pub sudo_user: String,
    pub aggregator: String,
    /// Per-attempt timeout override. `None` means one chunk width.
    pub attempt_timeout: Option<Duration>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            time_range_hours: 48,
            chunk_minutes: 15,
            retries: 1,
            tsd_path: PathBuf::from(DEFAULT_TSD_PATH),
            cfg_path: PathBuf::from(DEFAULT_CFG_PATH),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            use_sudo: false,
            sudo_user: DEFAULT_SUDO_USER.to_string(),
            aggregator: DEFAULT_AGGREGATOR.to_string(),
            attempt_timeout: None,
        }
    }
}

impl SweepConfig {
    /// Check the configuration before any work begins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_range_hours == 0 {
            return Err(ConfigError::ZeroTimeRange);
        }
        if self.chunk_minutes == 0 {
            return Err(ConfigError::ZeroChunk);
        }
        if 60 % self.chunk_minutes != 0 {
            return Err(ConfigError::ChunkNotDivisor(self.chunk_minutes));
        }
        if window::checked_window_count(self.time_range_hours, self.chunk_minutes).is_none() {
            return Err(ConfigError::RangeTooLarge(self.time_range_hours));
        }
        if self.tsd_path.as_os_str().is_empty() {
            return Err(ConfigError::Empty { field: "tsd path" });
        }
        if self.store_path.as_os_str().is_empty() {
            return Err(ConfigError::Empty { field: "store path" });
        }
        if self.aggregator.trim().is_empty() {
            return Err(ConfigError::Empty { field: "aggregator" });
        }
        if self.use_sudo && self.sudo_user.trim().is_empty() {
            return Err(ConfigError::Empty { field: "sudo user" });
        }
        Ok(())
    }

    /// Number of repair windows each metric is swept over.
    pub fn window_count(&self) -> u32 {
        window::window_count(self.time_range_hours, self.chunk_minutes)
    }

    /// Wall-clock budget for a single repair attempt.
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
            .unwrap_or_else(|| Duration::from_secs(u64::from(self.chunk_minutes) * 60))
    }
}
