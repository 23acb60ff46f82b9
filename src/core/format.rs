//! Human-readable renderings of metric values.

use crate::core::types::LoadAverage;

const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Formats a byte count with binary magnitudes, e.g. `"1.50 KB"`.
///
/// Values past the last unit stay in PB (`"1024.00 PB"`).
///
/// # Panics
///
/// Panics if `bytes` is negative, infinite or NaN.
pub fn format_bytes(bytes: f64) -> String {
    assert!(
        bytes.is_finite() && bytes >= 0.0,
        "format_bytes called with {bytes}"
    );

    // Adding +0.0 turns -0.0 into 0.0, which would otherwise print a sign.
    let mut value = bytes + 0.0;
    let mut unit = 0;
    // Compare the value as it will be printed so 1023.999 becomes "1.00 KB".
    while unit < UNITS.len() - 1 && round_centi(value) >= 1024.0 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

fn round_centi(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats uptime as a clock with a day count, e.g. `"1 day, 2:03:04"`.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = seconds % 86_400 / 3_600;
    let minutes = seconds % 3_600 / 60;
    let secs = seconds % 60;

    let clock = format!("{hours}:{minutes:02}:{secs:02}");
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

pub fn format_load(load: Option<LoadAverage>) -> String {
    match load {
        Some(l) => format!("{:.2}, {:.2}, {:.2}", l.one, l.five, l.fifteen),
        None => "unavailable".to_string(),
    }
}

/// Cumulative totals, not rates.
pub fn format_network(sent: u64, received: u64) -> String {
    format!(
        "Sent: {}, Received: {}",
        format_bytes(sent as f64),
        format_bytes(received as f64)
    )
}
