use std::path::PathBuf;
use std::time::Duration;

use tracing::Level;

use crate::core::errors::WatchError;

/// Runtime settings for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Time between the starts of two samples.
    pub period: Duration,
    /// CPU measurement window inside each sample.
    pub cpu_window: Duration,
    /// Disk usage is reported for the volume holding this path.
    pub mount_point: PathBuf,
    pub log_path: PathBuf,
    pub log_level: Level,
    /// How long the input thread waits for a key per poll.
    pub input_poll: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            cpu_window: Duration::from_millis(100),
            mount_point: PathBuf::from("/"),
            log_path: PathBuf::from("system_monitor.log"),
            log_level: Level::INFO,
            input_poll: Duration::from_millis(250),
        }
    }
}

impl Config {
    pub fn validate(self) -> Result<Self, WatchError> {
        if self.period.is_zero() {
            return Err(WatchError::Config("sampling period must be non-zero".into()));
        }
        if self.cpu_window > self.period {
            return Err(WatchError::Config(format!(
                "CPU window {:?} exceeds sampling period {:?}",
                self.cpu_window, self.period
            )));
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(WatchError::Config("log path is empty".into()));
        }
        Ok(self)
    }
}
