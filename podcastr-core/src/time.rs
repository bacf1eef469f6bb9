//! Time and duration conversion utilities.
//!
//! The `HH:MM:SS` rendering used for episode durations and player progress,
//! plus playback speed scaling.

use std::time::Duration;

/// Extension trait for rendering durations.
pub trait DurationExt {
    /// Render as zero-padded `HH:MM:SS`, ignoring sub-second precision.
    fn to_clock_string(&self) -> String;
}

impl DurationExt for Duration {
    fn to_clock_string(&self) -> String {
        format_clock(self.as_secs())
    }
}

/// Format a number of seconds as `HH:MM:SS`.
///
/// Hours are not wrapped at 24, so a 25 hour recording renders as `25:00:00`.
#[must_use]
pub fn format_clock(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Scale a duration by a playback speed factor.
///
/// Non-finite or non-positive factors leave the duration unchanged.
#[must_use]
pub fn scale_duration(duration: Duration, speed: f64) -> Duration {
    if !speed.is_finite() || speed <= 0.0 {
        return duration;
    }
    Duration::try_from_secs_f64(duration.as_secs_f64() / speed).unwrap_or(Duration::MAX)
}
