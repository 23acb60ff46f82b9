//! A terminal dashboard for host metrics built on sysinfo, ratatui and
//! crossterm.
//!
//! CPU, memory, swap, disk, uptime, load and network counters are sampled
//! once per period on a worker thread and pushed to a [`sink::DisplaySink`].
//! Each tick is also logged as one line to an append-only file.

pub mod config;
pub mod core;
pub mod event;
pub mod logging;
pub mod sample_loop;
pub mod sink;
pub mod ui;
pub mod workers;
