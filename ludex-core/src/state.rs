use serde::{Deserialize, Serialize};

/// Ball state machine states within one trial.
///
/// `HitHouse`, `Hit` and `HitTarget` are only used by the discrete
/// prediction game; the paddle game goes straight from `Fall` to a
/// terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallState {
    /// Waiting in the launcher box for the cue/jitter window to elapse.
    Start,
    /// Free flight along the drawn trajectory.
    Fall,
    /// Reached the intermediate zone; the input timeout is running.
    HitHouse,
    /// A response was registered (or forced); settling before evaluation.
    Hit,
    /// Outcome resolved and on display.
    HitTarget,
}

/// Final outcome recorded for a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialOutcome {
    /// The response matched the correct window, or the ball reached the target.
    HitTarget,
    /// A response was given but did not match, or the ball left the canvas.
    Missed,
    /// No response before the forced timeout.
    TimedOut,
}

/// Discrete response keys, one per target window row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKey {
    Upper,
    Middle,
    Lower,
}

impl GameKey {
    /// Index into the pressed-flags array / window catalog.
    pub fn index(self) -> usize {
        match self {
            GameKey::Upper => 0,
            GameKey::Middle => 1,
            GameKey::Lower => 2,
        }
    }
}
