use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::Local;
use sysinfo::{Disks, Networks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::{debug, warn};

use crate::core::errors::SamplerError;
use crate::core::types::{checked_percent, usage_percent, LoadAverage, Metric, MetricSnapshot};

/// Anything that can produce one snapshot per call.
pub trait MetricSource {
    /// Queries the host once. All-or-nothing: any failed metric fails the
    /// whole sample, except load average which degrades to `None`.
    fn sample(&mut self) -> Result<MetricSnapshot, SamplerError>;
}

/// Collects metrics from the underlying OS through a single sysinfo query
/// object.
pub struct Collector {
    sys: System,
    disks: Disks,
    networks: Networks,
    mount_point: PathBuf,
    cpu_window: Duration,
}

impl Collector {
    /// Creates a collector for the volume holding `mount_point`.
    ///
    /// `cpu_window` is how long each sample measures CPU usage for; it is
    /// raised to sysinfo's minimum update interval when shorter.
    pub fn new(mount_point: impl Into<PathBuf>, cpu_window: Duration) -> Self {
        let mut sys = System::new();
        // Baseline for the first CPU delta.
        sys.refresh_cpu_usage();
        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            mount_point: mount_point.into(),
            cpu_window,
        }
    }

    fn cpu_percent(&mut self) -> Result<f64, SamplerError> {
        self.sys.refresh_cpu_usage();
        thread::sleep(self.cpu_window.max(MINIMUM_CPU_UPDATE_INTERVAL));
        self.sys.refresh_cpu_usage();
        checked_percent(Metric::Cpu, f64::from(self.sys.global_cpu_usage()))
    }

    fn memory_and_swap(&mut self) -> Result<(f64, f64), SamplerError> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(SamplerError::failed(Metric::Memory, "total memory reported as 0"));
        }
        let memory = checked_percent(Metric::Memory, usage_percent(self.sys.used_memory(), total))?;
        let swap = checked_percent(
            Metric::Swap,
            usage_percent(self.sys.used_swap(), self.sys.total_swap()),
        )?;
        Ok((memory, swap))
    }

    fn disk_percent(&mut self) -> Result<f64, SamplerError> {
        self.disks.refresh(true);
        let mut index = pick_volume(
            self.disks.list().iter().map(|d| d.mount_point()),
            &self.mount_point,
        );
        if index.is_none() {
            // Volume may have been mounted since the list was built.
            self.disks = Disks::new_with_refreshed_list();
            index = pick_volume(
                self.disks.list().iter().map(|d| d.mount_point()),
                &self.mount_point,
            );
        }
        let disk = index
            .and_then(|i| self.disks.list().get(i))
            .ok_or_else(|| {
                SamplerError::failed(
                    Metric::Disk,
                    format!("no volume mounted at {}", self.mount_point.display()),
                )
            })?;

        let total = disk.total_space();
        if total == 0 {
            return Err(SamplerError::failed(
                Metric::Disk,
                format!("{} reports zero capacity", disk.mount_point().display()),
            ));
        }
        let used = total.saturating_sub(disk.available_space());
        checked_percent(Metric::Disk, usage_percent(used, total))
    }

    fn network_totals(&mut self) -> (u64, u64) {
        self.networks.refresh(true);
        self.networks
            .list()
            .values()
            .fold((0u64, 0u64), |(sent, received), data| {
                (
                    sent.saturating_add(data.total_transmitted()),
                    received.saturating_add(data.total_received()),
                )
            })
    }
}

impl MetricSource for Collector {
    fn sample(&mut self) -> Result<MetricSnapshot, SamplerError> {
        let cpu_percent = self.cpu_percent()?;
        let (memory_percent, swap_percent) = self.memory_and_swap()?;
        let disk_percent = self.disk_percent()?;

        let load_average = degrade_load(load_average())?;

        let (bytes_sent, bytes_received) = self.network_totals();

        Ok(MetricSnapshot {
            cpu_percent,
            memory_percent,
            swap_percent,
            disk_percent,
            uptime_seconds: System::uptime(),
            load_average,
            bytes_sent,
            bytes_received,
            sampled_at: Local::now(),
        })
    }
}

fn load_average() -> Result<Option<LoadAverage>, SamplerError> {
    if cfg!(windows) {
        return Err(SamplerError::QueryUnavailable {
            metric: Metric::Load,
        });
    }
    let raw = System::load_average();
    Ok(checked_load(LoadAverage {
        one: raw.one,
        five: raw.five,
        fifteen: raw.fifteen,
    }))
}

/// Drops a garbage load reading instead of failing the sample over an
/// optional metric.
fn checked_load(load: LoadAverage) -> Option<LoadAverage> {
    if [load.one, load.five, load.fifteen]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
    {
        Some(load)
    } else {
        warn!("ignoring invalid load average {load:?}");
        None
    }
}

/// Load average missing on this platform becomes `None`; any other failure
/// still fails the sample.
fn degrade_load(
    load: Result<Option<LoadAverage>, SamplerError>,
) -> Result<Option<LoadAverage>, SamplerError> {
    match load {
        Ok(load) => Ok(load),
        Err(err @ SamplerError::QueryUnavailable { .. }) => {
            debug!("{err}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Index of the mount point that contains `target`, preferring the deepest.
fn pick_volume<'a>(mounts: impl Iterator<Item = &'a Path>, target: &Path) -> Option<usize> {
    mounts
        .enumerate()
        .filter(|(_, mount)| target.starts_with(mount))
        .max_by_key(|(_, mount)| mount.components().count())
        .map(|(i, _)| i)
}
