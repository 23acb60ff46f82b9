//! Entry point: parses flags, opens the log, starts the sampler and input
//! workers, and runs the UI loop until the user exits.

use std::io::Stdout;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, Level};

use optima_watch::config::Config;
use optima_watch::core::collector::Collector;
use optima_watch::event::{AppEvent, EventHandler};
use optima_watch::logging;
use optima_watch::sample_loop::{self, CancelToken, SampleLoop};
use optima_watch::sink::{ChannelSink, DisplaySink};
use optima_watch::ui::{self, Action, Dashboard};
use optima_watch::workers::Workers;

/// Live CPU, memory, swap, disk, uptime, load and network readings.
#[derive(Parser, Debug)]
#[command(name = "optima-watch")]
#[command(version)]
#[command(about = "Terminal dashboard for host system metrics", long_about = None)]
struct Cli {
    /// Sampling period in milliseconds
    #[arg(short, long, default_value = "1000")]
    period: u64,

    /// CPU measurement window in milliseconds
    #[arg(long, default_value = "100")]
    cpu_window: u64,

    /// Report disk usage for the volume holding this path
    #[arg(short, long, default_value = "/")]
    mount: PathBuf,

    /// Append-only log file
    #[arg(short, long, default_value = "system_monitor.log")]
    log: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            period: Duration::from_millis(self.period),
            cpu_window: Duration::from_millis(self.cpu_window),
            mount_point: self.mount,
            log_path: self.log,
            log_level: self.log_level,
            ..Config::default()
        }
    }
}

fn main() -> Result<()> {
    let config = Cli::parse().into_config().validate()?;
    let log = logging::file_dispatch(&config.log_path, config.log_level)?;

    tracing::dispatcher::with_default(&log, || run(&config, log.clone()))
}

fn run(config: &Config, log: tracing::Dispatch) -> Result<()> {
    let cancel = CancelToken::new();
    let (tx, rx) = mpsc::channel();

    let collector = Collector::new(config.mount_point.clone(), config.cpu_window);
    let sampler = sample_loop::spawn(
        SampleLoop::new(collector, log),
        ChannelSink::new(tx.clone()),
        config.period,
        cancel.clone(),
    )?;

    let handler = EventHandler::new(config.input_poll);
    let input = thread::Builder::new().name("input".into()).spawn({
        let cancel = cancel.clone();
        move || handler.run(tx, &cancel)
    })?;

    let workers = Workers::new(cancel.clone(), sampler, Some(input));

    let mut terminal = match ui::setup_terminal() {
        Ok(terminal) => terminal,
        Err(err) => {
            workers.shutdown();
            return Err(err.into());
        }
    };
    let result = ui_loop(&mut terminal, &rx, &cancel);
    let restored = ui::restore_terminal(&mut terminal);

    // Unblock workers still sending into the channel.
    drop(rx);
    workers.shutdown();

    restored?;
    result
}

fn ui_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    rx: &Receiver<AppEvent>,
    cancel: &CancelToken,
) -> Result<()> {
    let mut dashboard = Dashboard::new();

    loop {
        terminal.draw(|frame| dashboard.draw(frame))?;

        match rx.recv() {
            Ok(AppEvent::Input(key)) => {
                if dashboard.handle_key(key) == Action::Exit {
                    info!("Exiting application");
                    cancel.cancel();
                    return Ok(());
                }
            }
            Ok(AppEvent::Sample(snapshot)) => dashboard.update(snapshot),
            Ok(AppEvent::SampleFailed(err)) => dashboard.update_error(&err),
            Ok(AppEvent::Tick) => {}
            // Every sender is gone: both workers have stopped.
            Err(_) => return Ok(()),
        }
    }
}
