//! The audio primitive the binder drives, and the events it reports back.

use crate::time::DurationExt;
use std::fmt;
use std::time::Duration;

/// Identifies one load command; events carry it so stale ones can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(u64);

impl LoadId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load#{}", self.0)
    }
}

/// Source to load into the element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub id: LoadId,
    pub url: String,
    /// Duration advertised by the catalog; the element may learn a better one
    pub expected_duration: Duration,
}

/// Playback position as reported by the element. Display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub elapsed: Duration,
    pub duration: Duration,
}

impl Progress {
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {}",
            self.elapsed.to_clock_string(),
            self.duration.to_clock_string()
        )
    }
}

/// Native events of the audio element.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Enough data buffered to start
    CanPlay { load: LoadId },
    /// The element started producing audio
    Played { load: LoadId },
    /// The element paused on its own or on command
    Paused { load: LoadId },
    TimeUpdate { load: LoadId, position: Duration },
    /// Natural end of track
    Ended { load: LoadId },
    /// Network or decode failure
    Failed { load: LoadId, reason: String },
}

impl MediaEvent {
    /// The load this event belongs to
    #[must_use]
    pub const fn load(&self) -> LoadId {
        match self {
            Self::CanPlay { load }
            | Self::Played { load }
            | Self::Paused { load }
            | Self::TimeUpdate { load, .. }
            | Self::Ended { load }
            | Self::Failed { load, .. } => *load,
        }
    }
}

/// An audio playback primitive (an `<audio>` element, a native sink, a simulation).
///
/// Commands are fire-and-forget: results come back later as [`MediaEvent`]s.
pub trait MediaElement: Send {
    /// Replace the current source. Playback does not start until [`Self::play`].
    fn load(&mut self, request: LoadRequest);

    fn seek(&mut self, position: Duration);

    fn play(&mut self);

    fn pause(&mut self);

    /// Stop and release the current source.
    fn unload(&mut self);

    fn progress(&self) -> Progress;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_display_and_remaining() {
        let progress = Progress {
            elapsed: Duration::from_secs(62),
            duration: Duration::from_secs(180),
        };
        assert_eq!(progress.to_string(), "00:01:02 / 00:03:00");
        assert_eq!(progress.remaining(), Duration::from_secs(118));
    }

    #[test]
    fn test_remaining_saturates() {
        let progress = Progress {
            elapsed: Duration::from_secs(200),
            duration: Duration::from_secs(180),
        };
        assert_eq!(progress.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_event_load() {
        let load = LoadId::new(4);
        let event = MediaEvent::Failed {
            load,
            reason: "404".into(),
        };
        assert_eq!(event.load(), load);
        assert_eq!(load.next(), LoadId::new(5));
        assert_eq!(load.to_string(), "load#4");
    }
}
