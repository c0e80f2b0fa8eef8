use crate::error::GameError;

/// Readiness of a preloadable media asset.
///
/// Loads are fire-and-forget; the frame loop polls this flag instead of
/// waiting on completion callbacks. A `Failed` asset is skipped at
/// draw/play time, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    Pending,
    Ready,
    Failed,
}

/// Host-provided audio cue, specified at the boundary only.
///
/// `play` may fail transiently; the engine retries on the next tick
/// rather than surfacing the error. Completion is observed by polling
/// `has_ended` from the loop.
pub trait AudioCue {
    fn state(&self) -> MediaState;
    fn play(&mut self) -> Result<(), GameError>;
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    fn has_ended(&self) -> bool;
}

/// Cue implementation with no audio backend.
///
/// Tracks play/stop state and reports ended as soon as `finish` is called
/// (tests) or immediately when constructed with a zero span. Used where a
/// study runs without sound.
#[derive(Debug, Default)]
pub struct SilentCue {
    playing: bool,
    ended: bool,
}

impl SilentCue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the cue as having run to completion.
    pub fn finish(&mut self) {
        self.playing = false;
        self.ended = true;
    }
}

impl AudioCue for SilentCue {
    fn state(&self) -> MediaState {
        MediaState::Ready
    }

    fn play(&mut self) -> Result<(), GameError> {
        if !self.ended {
            self.playing = true;
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn has_ended(&self) -> bool {
        self.ended
    }
}
