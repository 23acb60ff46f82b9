use std::io;
use std::sync::mpsc::Sender;
use std::time::Duration;

use crossterm::event::{self, Event as CEvent, KeyEvent, KeyEventKind};

use crate::core::errors::SamplerError;
use crate::core::types::MetricSnapshot;
use crate::sample_loop::CancelToken;

/// Events that the UI thread can receive.
#[derive(Debug)]
pub enum AppEvent {
    /// Input poll timed out; nothing happened.
    Tick,
    /// A key press event from the user.
    Input(KeyEvent),
    /// The sample loop produced a snapshot.
    Sample(MetricSnapshot),
    /// The sample loop failed a tick.
    SampleFailed(SamplerError),
}

/// Handles polling for user input.
///
/// The handler repeatedly polls the terminal for key events with a timeout
/// equal to `tick_rate`. Key presses go out as `AppEvent::Input`; a timeout
/// sends `AppEvent::Tick`. The loop ends once `cancel` fires or the receiver
/// is dropped.
pub struct EventHandler {
    /// How long each poll waits for input.
    pub tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        EventHandler { tick_rate }
    }

    /// Run the input loop, sending events through `tx`.
    pub fn run(&self, tx: Sender<AppEvent>, cancel: &CancelToken) {
        self.pump(tx, cancel, read_terminal)
    }

    /// `poll` returns `Ok(None)` for events the UI ignores. A failed poll
    /// waits out one tick before retrying, so a broken terminal cannot spin.
    fn pump<P>(&self, tx: Sender<AppEvent>, cancel: &CancelToken, mut poll: P)
    where
        P: FnMut(Duration) -> io::Result<Option<AppEvent>>,
    {
        while !cancel.is_cancelled() {
            let event = match poll(self.tick_rate) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(_) => {
                    cancel.wait_timeout(self.tick_rate);
                    continue;
                }
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    }
}

fn read_terminal(timeout: Duration) -> io::Result<Option<AppEvent>> {
    if !event::poll(timeout)? {
        return Ok(Some(AppEvent::Tick));
    }
    match event::read()? {
        CEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(AppEvent::Input(key))),
        // Releases, repeats, mouse and resize events.
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Instant;

    use super::*;

    #[test]
    fn failing_poll_backs_off_without_sending() {
        let handler = EventHandler::new(Duration::from_millis(20));
        let cancel = CancelToken::new();
        let (tx, rx) = mpsc::channel();

        let stopper = {
            let cancel = cancel.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(100));
                cancel.cancel();
            })
        };

        let mut polls = 0u32;
        handler.pump(tx, &cancel, |_| {
            polls += 1;
            Err(io::Error::new(io::ErrorKind::Other, "not a tty"))
        });
        stopper.join().unwrap();

        // One poll per tick over ~100 ms, not a spin.
        assert!(polls <= 10, "{polls} polls");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn ignored_events_are_not_forwarded() {
        let handler = EventHandler::new(Duration::from_millis(1));
        let cancel = CancelToken::new();
        let (tx, rx) = mpsc::channel();

        let mut polls = 0u32;
        let token = cancel.clone();
        handler.pump(tx, &cancel, |_| {
            polls += 1;
            match polls {
                1 => Ok(None),
                2 => Ok(Some(AppEvent::Tick)),
                _ => {
                    token.cancel();
                    Ok(None)
                }
            }
        });

        assert!(matches!(rx.try_recv(), Ok(AppEvent::Tick)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stops_when_receiver_is_dropped() {
        let handler = EventHandler::new(Duration::from_millis(1));
        let cancel = CancelToken::new();
        let (tx, rx) = mpsc::channel();
        drop(rx);

        let started = Instant::now();
        handler.pump(tx, &cancel, |_| Ok(Some(AppEvent::Tick)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
