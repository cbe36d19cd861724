//! Timestamp and timecode utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert seconds to a sample-accurate position: `round(seconds * rate)`
///
/// Negative and non-finite inputs map to 0.
pub fn seconds_to_samples(seconds: f64, sample_rate_hz: u32) -> u64 {
    let samples = (seconds * sample_rate_hz as f64).round();
    if samples.is_finite() && samples > 0.0 {
        samples as u64
    } else {
        0
    }
}

/// Format seconds as a human-readable timecode
///
/// `MM:SS.mmm` below one hour, `H:MM:SS.mmm` above.
pub fn format_timecode(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    if hours > 0 {
        format!("{}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
    } else {
        format!("{:02}:{:02}.{:03}", mins, secs, ms)
    }
}
