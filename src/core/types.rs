use std::fmt;

use chrono::{DateTime, Local};

use crate::core::errors::SamplerError;

/// The fixed set of tracked metrics, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Cpu,
    Memory,
    Swap,
    Disk,
    Uptime,
    Load,
    Network,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Cpu,
        Metric::Memory,
        Metric::Swap,
        Metric::Disk,
        Metric::Uptime,
        Metric::Load,
        Metric::Network,
    ];

    /// Dashboard row label.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Cpu => "CPU Usage:",
            Metric::Memory => "Memory Usage:",
            Metric::Swap => "Swap Usage:",
            Metric::Disk => "Disk Usage:",
            Metric::Uptime => "System Uptime:",
            Metric::Load => "Load Average:",
            Metric::Network => "Network Traffic:",
        }
    }

    /// Whether the metric renders as a 0–100 gauge rather than text.
    pub fn is_gauge(self) -> bool {
        matches!(
            self,
            Metric::Cpu | Metric::Memory | Metric::Swap | Metric::Disk
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Cpu => "CPU",
            Metric::Memory => "Memory",
            Metric::Swap => "Swap",
            Metric::Disk => "Disk",
            Metric::Uptime => "Uptime",
            Metric::Load => "Load",
            Metric::Network => "Network",
        };
        f.write_str(name)
    }
}

/// OS load averages over 1, 5 and 15 minutes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// Bytes moved between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Traffic {
    pub sent: u64,
    pub received: u64,
}

/// One immutable bundle of every tracked metric, taken at a single instant.
///
/// Produced fresh on every tick and handed to sinks by value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub swap_percent: f64,
    /// Usage of the volume holding the configured mount point.
    pub disk_percent: f64,
    pub uptime_seconds: u64,
    /// `None` where the platform has no load average.
    pub load_average: Option<LoadAverage>,
    /// Cumulative since boot, summed over all interfaces.
    pub bytes_sent: u64,
    /// Cumulative since boot, summed over all interfaces.
    pub bytes_received: u64,
    pub sampled_at: DateTime<Local>,
}

impl MetricSnapshot {
    /// Traffic since an earlier snapshot.
    ///
    /// The counters are cumulative; a counter that went backwards (interface
    /// reset, reboot) is reported as zero traffic, never negative.
    pub fn traffic_since(&self, earlier: &MetricSnapshot) -> Traffic {
        Traffic {
            sent: self.bytes_sent.saturating_sub(earlier.bytes_sent),
            received: self.bytes_received.saturating_sub(earlier.bytes_received),
        }
    }

    /// Gauge value for a percent metric, `None` for text metrics.
    pub fn percent(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Cpu => Some(self.cpu_percent),
            Metric::Memory => Some(self.memory_percent),
            Metric::Swap => Some(self.swap_percent),
            Metric::Disk => Some(self.disk_percent),
            _ => None,
        }
    }
}

/// Validates a raw percentage reading and clamps it into `[0, 100]`.
///
/// Non-finite readings are a failed query; they cannot be clamped into a
/// meaningful value.
pub fn checked_percent(metric: Metric, raw: f64) -> Result<f64, SamplerError> {
    if !raw.is_finite() {
        return Err(SamplerError::failed(
            metric,
            format!("non-finite reading {raw}"),
        ));
    }
    Ok(raw.clamp(0.0, 100.0))
}

/// `used / total` as a percentage. A zero total counts as 0 %.
pub fn usage_percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used.min(total) as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(sent: u64, received: u64) -> MetricSnapshot {
        MetricSnapshot {
            cpu_percent: 1.0,
            memory_percent: 2.0,
            swap_percent: 3.0,
            disk_percent: 4.0,
            uptime_seconds: 5,
            load_average: None,
            bytes_sent: sent,
            bytes_received: received,
            sampled_at: Local::now(),
        }
    }

    #[test]
    fn traffic_since_counts_growth() {
        let a = snapshot(100, 1_000);
        let b = snapshot(350, 1_024);
        assert_eq!(
            b.traffic_since(&a),
            Traffic {
                sent: 250,
                received: 24
            }
        );
    }

    #[test]
    fn traffic_since_never_goes_negative() {
        let before_reset = snapshot(5_000, 9_000);
        let after_reset = snapshot(10, 20);
        assert_eq!(after_reset.traffic_since(&before_reset), Traffic::default());
    }

    #[test]
    fn percent_only_for_gauges() {
        let s = snapshot(0, 0);
        for metric in Metric::ALL {
            assert_eq!(s.percent(metric).is_some(), metric.is_gauge(), "{metric}");
        }
    }

    #[test]
    fn checked_percent_clamps_and_rejects_nan() {
        assert_eq!(checked_percent(Metric::Cpu, 100.4), Ok(100.0));
        assert_eq!(checked_percent(Metric::Cpu, -0.1), Ok(0.0));
        assert_eq!(checked_percent(Metric::Cpu, 42.5), Ok(42.5));
        assert!(matches!(
            checked_percent(Metric::Cpu, f64::NAN),
            Err(SamplerError::QueryFailed {
                metric: Metric::Cpu,
                ..
            })
        ));
    }

    #[test]
    fn usage_percent_handles_zero_total() {
        assert_eq!(usage_percent(0, 0), 0.0);
        assert_eq!(usage_percent(512, 1024), 50.0);
        assert_eq!(usage_percent(2048, 1024), 100.0);
    }
}
