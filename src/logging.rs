//! Append-only `<timestamp>:<LEVEL>:<message>` log records.
//!
//! Loggers are built as explicit [`Dispatch`] values and scoped by the code
//! that owns them; nothing here installs a global subscriber.

use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;

use crate::core::errors::WatchError;

/// `2026-10-17 09:15:02,481`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Formats each event as a single `<timestamp>:<LEVEL>:<message>` line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLineFormat;

impl<S, N> FormatEvent<S, N> for LogLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{}:{}:",
            Local::now().format(TIMESTAMP_FORMAT),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Builds a logger writing records at `level` and above to `make_writer`.
pub fn dispatch<W>(make_writer: W, level: Level) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_writer(make_writer)
        .with_ansi(false)
        .with_max_level(level)
        .event_format(LogLineFormat)
        .finish();
    Dispatch::new(subscriber)
}

/// Builds a logger appending to `path`, creating the file if absent.
///
/// Writes go through a mutex, so several loops may share the dispatch.
pub fn file_dispatch(path: &Path, level: Level) -> Result<Dispatch, WatchError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| WatchError::LogFile {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(dispatch(Mutex::new(file), level))
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn lines_are_timestamp_level_message() {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let log = dispatch(move || writer.clone(), Level::INFO);

        tracing::dispatcher::with_default(&log, || {
            tracing::info!("Updated values: CPU {:.2}%", 12.5);
            tracing::debug!("filtered out");
        });

        let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1, "{text}");

        let line = lines[0];
        assert!(line.ends_with(":INFO:Updated values: CPU 12.50%"), "{line}");
        let stamp = line.trim_end_matches(":INFO:Updated values: CPU 12.50%");
        let (seconds, millis) = stamp.split_once(',').unwrap();
        assert!(
            chrono::NaiveDateTime::parse_from_str(seconds, "%Y-%m-%d %H:%M:%S").is_ok(),
            "bad timestamp {stamp:?}"
        );
        assert_eq!(millis.len(), 3);
        assert!(millis.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn missing_directory_is_a_log_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("watch.log");
        assert!(matches!(
            file_dispatch(&path, Level::INFO),
            Err(WatchError::LogFile { .. })
        ));
    }
}
