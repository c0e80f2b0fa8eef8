use serde::{Deserialize, Serialize};

/// Tuned study parameters.
///
/// The transition durations, the jitter range and the reverse window
/// lookup were calibrated empirically for the original study; they are
/// carried as data and never re-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Viewport scale factor as a fraction of canvas height. Geometry and
    /// velocities are expressed in scale units and multiplied by
    /// `canvas_height * height_scale` at draw time.
    pub height_scale: f32,
    /// Downward acceleration in scale units per second squared, for the
    /// prediction game's slow arc.
    pub gravity: f32,
    /// Downward acceleration for the paddle game. Its trajectory catalog
    /// assumes a much faster fall; under `gravity` the ball would leave
    /// the canvas top before the paddle or mouth is reachable.
    pub paddle_gravity: f32,
    /// Velocity factor applied on paddle bounce. Negative: the bounce
    /// reverses the incoming component.
    pub restitution: f32,
    /// Extra vertical multiplier on bounce, simulating lift.
    pub paddle_lift: f32,
    /// Randomized delay between cue start and ball launch, seconds.
    pub jitter_range_secs: (f64, f64),
    /// Wait before the intro cue plays on the very first trial.
    pub initial_cue_delay_secs: f64,
    /// Free flight before the ball reaches the intermediate zone.
    pub fall_to_house_secs: f64,
    /// Forced transition out of the intermediate zone when no key comes.
    pub house_timeout_secs: f64,
    /// Settle delay between a registered press and its evaluation.
    pub settle_secs: f64,
    /// How long the resolved outcome stays on screen.
    pub outcome_display_secs: f64,
    /// Cap on free flight for the paddle game before the trial times out.
    pub max_flight_secs: f64,
    /// Obstruction (shuttle) size classes, 1-based.
    pub obstructions: Vec<u8>,
    /// Velocity buckets, 1-based. Must match `obstructions` in length.
    pub velocities: Vec<u8>,
    /// Reverse lookup from `velocity - 1` to the correct window index.
    pub correct_window_lookup: [usize; 3],
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            height_scale: 0.5,
            gravity: 1.8,
            paddle_gravity: 20.0,
            restitution: -1.5,
            paddle_lift: 1.12,
            jitter_range_secs: (0.5, 1.5),
            initial_cue_delay_secs: 2.5,
            fall_to_house_secs: 0.5,
            house_timeout_secs: 2.5,
            settle_secs: 0.5,
            outcome_display_secs: 3.0,
            max_flight_secs: 10.0,
            obstructions: vec![1, 2, 3],
            velocities: vec![1, 2, 3],
            correct_window_lookup: [2, 1, 0],
        }
    }
}
