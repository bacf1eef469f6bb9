//! Headless audio element.
//!
//! Keeps a clock instead of decoding audio: position is interpolated from the last
//! resume, and `Ended` fires when the (speed-scaled) remaining time runs out.

use podcastr_core::{scale_duration, LoadId, LoadRequest, MediaElement, MediaEvent, Progress};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const LOG_TARGET: &str = "podcastr::sim";

pub struct SimulatedAudio {
    events: mpsc::UnboundedSender<MediaEvent>,
    speed: f64,
    load: Option<LoadId>,
    duration: Duration,
    /// Position at the last pause or seek
    position: Duration,
    resumed_at: Option<Instant>,
    /// Cancels the pending end-of-track timer
    segment: Option<CancellationToken>,
}

impl SimulatedAudio {
    #[must_use]
    pub fn new(events: mpsc::UnboundedSender<MediaEvent>, speed: f64) -> Self {
        Self {
            events,
            speed,
            load: None,
            duration: Duration::ZERO,
            position: Duration::ZERO,
            resumed_at: None,
            segment: None,
        }
    }

    fn current_position(&self) -> Duration {
        let position = match self.resumed_at {
            Some(resumed_at) => {
                let real = resumed_at.elapsed().as_secs_f64() * self.speed;
                self.position + Duration::try_from_secs_f64(real).unwrap_or(Duration::ZERO)
            }
            None => self.position,
        };
        position.min(self.duration)
    }

    fn send(&self, event: MediaEvent) {
        let _ = self.events.send(event);
    }

    fn cancel_segment(&mut self) {
        if let Some(token) = self.segment.take() {
            token.cancel();
        }
    }

    fn start_segment(&mut self, load: LoadId) {
        self.cancel_segment();
        let remaining = scale_duration(self.duration.saturating_sub(self.position), self.speed);
        let token = CancellationToken::new();
        let events = self.events.clone();
        let cancelled = token.clone();
        debug!(target: LOG_TARGET, "{} ends in {:?}", load, remaining);

        tokio::spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => {}
                () = tokio::time::sleep(remaining) => {
                    let _ = events.send(MediaEvent::Ended { load });
                }
            }
        });
        self.segment = Some(token);
    }
}

impl MediaElement for SimulatedAudio {
    fn load(&mut self, request: LoadRequest) {
        self.cancel_segment();
        self.load = Some(request.id);
        self.duration = request.expected_duration;
        self.position = Duration::ZERO;
        self.resumed_at = None;

        if request.url.trim().is_empty() {
            // Nothing to play; transport commands are ignored until the next load
            self.load = None;
            self.send(MediaEvent::Failed {
                load: request.id,
                reason: "episode has no audio URL".into(),
            });
        } else {
            debug!(target: LOG_TARGET, "Loaded {} from {}", request.id, request.url);
            self.send(MediaEvent::CanPlay { load: request.id });
        }
    }

    fn seek(&mut self, position: Duration) {
        let playing = self.resumed_at.is_some();
        self.position = position.min(self.duration);
        if playing {
            self.resumed_at = Some(Instant::now());
            if let Some(load) = self.load {
                self.start_segment(load);
            }
        }
    }

    fn play(&mut self) {
        let Some(load) = self.load else {
            return;
        };
        if self.resumed_at.is_some() {
            return;
        }
        self.resumed_at = Some(Instant::now());
        self.start_segment(load);
        self.send(MediaEvent::Played { load });
    }

    fn pause(&mut self) {
        let Some(load) = self.load else {
            return;
        };
        if self.resumed_at.is_none() {
            return;
        }
        self.position = self.current_position();
        self.resumed_at = None;
        self.cancel_segment();
        self.send(MediaEvent::Paused { load });
    }

    fn unload(&mut self) {
        self.cancel_segment();
        self.load = None;
        self.duration = Duration::ZERO;
        self.position = Duration::ZERO;
        self.resumed_at = None;
    }

    fn progress(&self) -> Progress {
        Progress {
            elapsed: self.current_position(),
            duration: self.duration,
        }
    }
}

impl Drop for SimulatedAudio {
    fn drop(&mut self) {
        self.cancel_segment();
    }
}
