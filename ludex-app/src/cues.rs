use std::time::{Duration, Instant};

use ludex_core::{AudioCue, GameError, MediaState};

/// Cue that models sound playback as a fixed span of wall time.
///
/// The study protocol only depends on when a cue *ends*, so a timed
/// stand-in keeps the trial pacing intact on machines without audio
/// output configured.
pub struct TimedCue {
    span: Duration,
    started: Option<Instant>,
}

impl TimedCue {
    pub fn new(span: Duration) -> Self {
        Self {
            span,
            started: None,
        }
    }

    pub fn from_secs(secs: f64) -> Self {
        Self::new(Duration::from_secs_f64(secs))
    }
}

impl AudioCue for TimedCue {
    fn state(&self) -> MediaState {
        MediaState::Ready
    }

    fn play(&mut self) -> Result<(), GameError> {
        self.started = Some(Instant::now());
        Ok(())
    }

    fn stop(&mut self) {
        self.started = None;
    }

    fn is_playing(&self) -> bool {
        self.started.is_some_and(|s| s.elapsed() < self.span)
    }

    fn has_ended(&self) -> bool {
        self.started.is_some_and(|s| s.elapsed() >= self.span)
    }
}
