//! Consumers of snapshots, decoupled from how (or whether) they render them.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};

use crate::core::errors::SamplerError;
use crate::core::types::MetricSnapshot;
use crate::event::AppEvent;
use crate::sample_loop::CancelToken;

/// Receives the outcome of every sampling tick.
///
/// Called from the sampling worker, so implementations that render on
/// another thread must hand the value over themselves (see [`ChannelSink`]).
pub trait DisplaySink {
    fn update(&mut self, snapshot: MetricSnapshot);

    /// A tick failed; the sink should show a stale/degraded state.
    fn update_error(&mut self, err: &SamplerError);
}

impl<S: DisplaySink + ?Sized> DisplaySink for &mut S {
    fn update(&mut self, snapshot: MetricSnapshot) {
        (**self).update(snapshot)
    }

    fn update_error(&mut self, err: &SamplerError) {
        (**self).update_error(err)
    }
}

impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    fn update(&mut self, snapshot: MetricSnapshot) {
        (**self).update(snapshot)
    }

    fn update_error(&mut self, err: &SamplerError) {
        (**self).update_error(err)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn update(&mut self, _snapshot: MetricSnapshot) {}

    fn update_error(&mut self, _err: &SamplerError) {}
}

/// One call made on a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Update(MetricSnapshot),
    Error(SamplerError),
}

/// Records every call. Clones share the same record, so a clone kept by the
/// caller can observe a sink that was moved into a worker thread.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
    cancel_after: Option<(usize, CancelToken)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels `token` once `calls` calls have been recorded, which bounds a
    /// sample loop to exactly that many ticks.
    pub fn cancel_after(calls: usize, token: CancelToken) -> Self {
        Self {
            calls: Arc::default(),
            cancel_after: Some((calls, token)),
        }
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn update_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|c| matches!(c, SinkCall::Update(_)))
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|c| matches!(c, SinkCall::Error(_)))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SinkCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&mut self, call: SinkCall) {
        let recorded = {
            let mut calls = self.lock();
            calls.push(call);
            calls.len()
        };
        if let Some((limit, token)) = &self.cancel_after {
            if recorded >= *limit {
                token.cancel();
            }
        }
    }
}

impl DisplaySink for RecordingSink {
    fn update(&mut self, snapshot: MetricSnapshot) {
        self.record(SinkCall::Update(snapshot));
    }

    fn update_error(&mut self, err: &SamplerError) {
        self.record(SinkCall::Error(err.clone()));
    }
}

/// Forwards tick results to the UI thread's event queue.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<AppEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl DisplaySink for ChannelSink {
    fn update(&mut self, snapshot: MetricSnapshot) {
        // The receiver only goes away while the app is shutting down.
        let _ = self.tx.send(AppEvent::Sample(snapshot));
    }

    fn update_error(&mut self, err: &SamplerError) {
        let _ = self.tx.send(AppEvent::SampleFailed(err.clone()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use chrono::Local;

    use super::*;
    use crate::core::types::Metric;

    fn snapshot() -> MetricSnapshot {
        MetricSnapshot {
            cpu_percent: 10.0,
            memory_percent: 20.0,
            swap_percent: 0.0,
            disk_percent: 30.0,
            uptime_seconds: 60,
            load_average: None,
            bytes_sent: 1,
            bytes_received: 2,
            sampled_at: Local::now(),
        }
    }

    #[test]
    fn recording_sink_clones_share_calls() {
        let observer = RecordingSink::new();
        let mut sink = observer.clone();
        sink.update(snapshot());
        sink.update_error(&SamplerError::failed(Metric::Disk, "gone"));

        assert_eq!(observer.len(), 2);
        assert_eq!(observer.update_count(), 1);
        assert_eq!(observer.error_count(), 1);
    }

    #[test]
    fn recording_sink_cancels_at_limit() {
        let token = CancelToken::new();
        let mut sink = RecordingSink::cancel_after(2, token.clone());
        sink.update(snapshot());
        assert!(!token.is_cancelled());
        sink.update(snapshot());
        assert!(token.is_cancelled());
    }

    #[test]
    fn channel_sink_forwards_events() {
        let (tx, rx) = mpsc::channel();
        let mut sink = ChannelSink::new(tx);
        sink.update(snapshot());
        sink.update_error(&SamplerError::Fatal("x".into()));

        assert!(matches!(rx.recv(), Ok(AppEvent::Sample(_))));
        assert!(matches!(
            rx.recv(),
            Ok(AppEvent::SampleFailed(SamplerError::Fatal(_)))
        ));
    }

    #[test]
    fn channel_sink_survives_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        sink.update(snapshot());
    }
}
