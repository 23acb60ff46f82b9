//! Fixed-period sampling driven on a dedicated worker.

use std::io;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{error, info, warn, Dispatch};

use crate::core::collector::MetricSource;
use crate::core::errors::SamplerError;
use crate::sink::DisplaySink;

/// Cooperative cancellation shared between the UI and the sample loop.
///
/// Cancelling also wakes a loop that is waiting out its period.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, wake) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks for up to `timeout`. Returns `true` if cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, wake) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = wake
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// Time left to sleep after a tick took `elapsed`; zero once overrun.
pub fn remaining(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

/// Drives a [`MetricSource`] and reports each tick to a sink and a logger.
pub struct SampleLoop<M> {
    source: M,
    log: Dispatch,
}

impl<M: MetricSource> SampleLoop<M> {
    /// `log` receives one record per tick; it is scoped to the loop rather
    /// than installed globally.
    pub fn new(source: M, log: Dispatch) -> Self {
        Self { source, log }
    }

    /// Runs ticks until `cancel` is signalled or the source reports a fatal
    /// error. Returns the number of ticks run.
    ///
    /// Cancellation is only observed between ticks; a sample in progress
    /// always completes and is delivered.
    pub fn run(
        &mut self,
        sink: &mut dyn DisplaySink,
        period: Duration,
        cancel: &CancelToken,
    ) -> Result<u64, SamplerError> {
        let log = self.log.clone();
        tracing::dispatcher::with_default(&log, || -> Result<u64, SamplerError> {
            let mut ticks = 0u64;
            while !cancel.is_cancelled() {
                let started = Instant::now();
                self.tick(sink)?;
                ticks += 1;
                if cancel.wait_timeout(remaining(period, started.elapsed())) {
                    break;
                }
            }
            Ok(ticks)
        })
    }

    fn tick(&mut self, sink: &mut dyn DisplaySink) -> Result<(), SamplerError> {
        match self.source.sample() {
            Ok(snapshot) => {
                info!(
                    "Updated values: CPU {:.2}%, Memory {:.2}%, Disk {:.2}%",
                    snapshot.cpu_percent, snapshot.memory_percent, snapshot.disk_percent
                );
                sink.update(snapshot);
                Ok(())
            }
            Err(err) if err.is_fatal() => {
                error!("Sampling stopped: {err}");
                sink.update_error(&err);
                Err(err)
            }
            Err(err) => {
                warn!("Sample failed: {err}");
                sink.update_error(&err);
                Ok(())
            }
        }
    }
}

/// Runs `sample_loop` on its own named thread until `cancel` fires.
pub fn spawn<M, S>(
    mut sample_loop: SampleLoop<M>,
    mut sink: S,
    period: Duration,
    cancel: CancelToken,
) -> io::Result<JoinHandle<Result<u64, SamplerError>>>
where
    M: MetricSource + Send + 'static,
    S: DisplaySink + Send + 'static,
{
    thread::Builder::new()
        .name("sampler".into())
        .spawn(move || sample_loop.run(&mut sink, period, &cancel))
}
