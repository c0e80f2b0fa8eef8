use glam::Vec2;
use ludex_core::row::TrialType;
use ludex_core::{AssetId, BallState, ExportRow, GameKey, Scene, TrialOutcome};
use ludex_timing::Clock;
use rand::Rng;

use crate::engine::GameEngine;
use crate::physics::Ball;
use crate::schedule::TrialParams;
use crate::session::{GameInput, GameVariant};

// Image asset slots the host preloads for this game.
pub const ASSET_LAUNCHER: AssetId = 0;
pub const ASSET_BALL: AssetId = 1;
pub const ASSET_SPLAT: AssetId = 2;
pub const ASSET_WINDOWS: [AssetId; 3] = [3, 4, 5];
pub const ASSET_SHUTTLES: [AssetId; 3] = [6, 7, 8];

// Audio cue slots.
pub const CUE_START: usize = 0;
pub const CUE_LAUNCH: usize = 1;
pub const CUE_CATCH: usize = 2;
pub const CUE_FAIL: usize = 3;

// Geometry in scale units, tuned for the study's layout.
const BALL_RADIUS: f32 = 0.02385;
const BALL_LAUNCH: Vec2 = Vec2::new(0.751, 1.3671);
const LAUNCHER_POS: Vec2 = Vec2::new(0.701, 1.3671);
const LAUNCHER_DIMS: Vec2 = Vec2::new(0.19, 0.273);
const WINDOW_DIMS: Vec2 = Vec2::new(0.10238, 0.075);
const WINDOW_TOPS: [f32; 3] = [1.12, 1.25, 1.39];
const WINDOW_LEFTS: [f32; 3] = [1.545, 1.555, 1.555];
const SHUTTLE_DIMS: Vec2 = Vec2::new(1.19, 1.135);
const SHUTTLE_TOP: f32 = 0.78;
const SHUTTLE_LEFTS: [f32; 3] = [0.81, 0.798, 0.77];
const SPLAT_DIMS: Vec2 = Vec2::new(0.09645, 0.09107);
const SPLAT_X_NUDGE: f32 = 0.0238;

// Launch velocity per bucket; stronger buckets reach higher windows.
const LAUNCH_VELOCITIES: [Vec2; 3] = [
    Vec2::new(1.6, -0.51),
    Vec2::new(1.6, -0.79),
    Vec2::new(1.6, -1.05),
];

/// The spatial prediction game: the ball flies from the launcher toward
/// one of three windows in the obstruction (shuttle), and the
/// participant predicts the landing window with one of three keys.
///
/// Per-trial state machine:
/// `Start -> Fall -> HitHouse -> Hit -> HitTarget -> complete`, with a
/// key press during Fall or HitHouse preempting straight to Hit.
pub struct DiscreteButtonSpatial<Ts> {
    params: TrialParams,
    trial_type: TrialType,
    ball: Option<Ball>,
    pressed: [bool; 3],
    jitter_secs: f64,
    trial_started_at: Option<Ts>,
    cue_started_at: Option<Ts>,
    fall_started_at: Option<Ts>,
    settle_started_at: Option<Ts>,
    outcome_started_at: Option<Ts>,
    matched: Option<bool>,
}

impl<Ts: Copy> DiscreteButtonSpatial<Ts> {
    pub fn new() -> Self {
        Self {
            params: TrialParams {
                obstruction: 1,
                velocity: 1,
            },
            trial_type: TrialType::Scheduled,
            ball: None,
            pressed: [false; 3],
            jitter_secs: 0.0,
            trial_started_at: None,
            cue_started_at: None,
            fall_started_at: None,
            settle_started_at: None,
            outcome_started_at: None,
            matched: None,
        }
    }

    /// Index of the pressed window key, if any. Last press wins.
    pub fn selected_index(&self) -> Option<usize> {
        self.pressed.iter().position(|&p| p)
    }

    pub fn ball_state(&self) -> BallState {
        self.ball
            .as_ref()
            .map_or(BallState::Start, |ball| ball.state)
    }

    /// The window the current velocity bucket actually lands in, via the
    /// study's reverse lookup table.
    fn correct_index(&self, lookup: &[usize; 3]) -> usize {
        let bucket = (self.params.velocity.max(1) as usize - 1).min(2);
        lookup[bucket]
    }

    fn launch_velocity(&self) -> Vec2 {
        let bucket = (self.params.velocity.max(1) as usize - 1).min(2);
        LAUNCH_VELOCITIES[bucket]
    }

    fn outcome(&self) -> TrialOutcome {
        match (self.matched, self.selected_index()) {
            (Some(true), _) => TrialOutcome::HitTarget,
            (_, None) => TrialOutcome::TimedOut,
            _ => TrialOutcome::Missed,
        }
    }

    fn build_row<C, R>(&self, engine: &GameEngine<C, R>, outcome: Option<TrialOutcome>) -> ExportRow
    where
        C: Clock<Timestamp = Ts>,
        R: Rng,
    {
        let unit = self
            .ball
            .as_ref()
            .map_or(BALL_LAUNCH, |ball| ball.unit_pos(engine.scale()));
        let reference = self
            .fall_started_at
            .or(self.cue_started_at)
            .or(self.trial_started_at);
        ExportRow::DiscreteButtonSpatial {
            trial: engine.round(),
            trial_type: self.trial_type,
            window: self.correct_index(&engine.config.correct_window_lookup) as u8 + 1,
            selected_button: self.selected_index().map_or(4, |i| i as u8 + 1),
            obstruction_number: self.params.obstruction,
            ball_position_x: unit.x,
            ball_position_y: unit.y,
            timestamp: reference.map_or(0.0, |t| engine.elapsed_secs(t)),
            outcome,
        }
    }

    fn enter_hit<C, R>(&mut self, engine: &mut GameEngine<C, R>)
    where
        C: Clock<Timestamp = Ts>,
        R: Rng,
    {
        if let Some(ball) = self.ball.as_mut() {
            ball.state = BallState::Hit;
        }
        self.settle_started_at = Some(engine.now());
        let row = self.build_row(engine, None);
        engine.store_row(row);
    }

    fn draw<C, R>(&self, engine: &GameEngine<C, R>, scene: &mut Scene)
    where
        C: Clock<Timestamp = Ts>,
        R: Rng,
    {
        let scale = engine.scale();
        scene.sprite(
            ASSET_LAUNCHER,
            LAUNCHER_POS.x * scale,
            LAUNCHER_POS.y * scale,
            LAUNCHER_DIMS.x * scale,
            LAUNCHER_DIMS.y * scale,
        );

        let Some(ball) = self.ball.as_ref() else {
            return;
        };

        // The ball is visible while waiting and in flight; once it passes
        // behind the shuttle it stays hidden until the outcome splat.
        if matches!(ball.state, BallState::Start | BallState::Fall) {
            scene.sprite(
                ASSET_BALL,
                ball.pos.x - ball.radius,
                ball.pos.y - ball.radius,
                ball.radius * 2.0,
                ball.radius * 2.0,
            );
        }

        let shuttle_class = (self.params.obstruction.max(1) as usize - 1).min(2);
        scene.sprite(
            ASSET_SHUTTLES[shuttle_class],
            SHUTTLE_LEFTS[shuttle_class] * scale,
            SHUTTLE_TOP * scale,
            SHUTTLE_DIMS.x * scale,
            SHUTTLE_DIMS.y * scale,
        );

        if ball.state == BallState::HitTarget {
            if let Some(index) = self.selected_index() {
                scene.sprite(
                    ASSET_WINDOWS[index],
                    WINDOW_LEFTS[index] * scale,
                    WINDOW_TOPS[index] * scale,
                    WINDOW_DIMS.x * scale,
                    WINDOW_DIMS.y * scale,
                );
            }
            let correct = self.correct_index(&engine.config.correct_window_lookup);
            scene.sprite(
                ASSET_SPLAT,
                (WINDOW_LEFTS[correct] - SPLAT_X_NUDGE) * scale,
                WINDOW_TOPS[correct] * scale,
                SPLAT_DIMS.x * scale,
                SPLAT_DIMS.y * scale,
            );
        }
    }
}

impl<Ts: Copy> Default for DiscreteButtonSpatial<Ts> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ts: Copy> GameInput for DiscreteButtonSpatial<Ts> {
    fn key_down(&mut self, key: GameKey) {
        // Input is honored only before evaluation starts.
        if matches!(self.ball_state(), BallState::Hit | BallState::HitTarget) {
            return;
        }
        self.pressed = [false; 3];
        self.pressed[key.index()] = true;
    }
}

impl<C, R> GameVariant<C, R> for DiscreteButtonSpatial<<C as Clock>::Timestamp>
where
    C: Clock,
    R: Rng,
{
    fn name(&self) -> &'static str {
        "discrete_button_spatial"
    }

    fn init_trial(
        &mut self,
        engine: &mut GameEngine<C, R>,
        params: TrialParams,
        trial_type: TrialType,
    ) {
        self.params = params;
        self.trial_type = trial_type;
        self.pressed = [false; 3];
        self.jitter_secs = engine.draw_jitter();
        self.ball = Some(Ball::new(
            BALL_LAUNCH,
            self.launch_velocity(),
            BALL_RADIUS * engine.scale(),
            engine.config.restitution,
            engine.scale(),
        ));
        self.trial_started_at = Some(engine.now());
        self.fall_started_at = None;
        self.settle_started_at = None;
        self.outcome_started_at = None;
        self.matched = None;

        // The very first trial holds the intro cue until the initial
        // delay has passed; later trials cue immediately.
        if engine.round() > 0 {
            engine.cues_mut().play(CUE_START);
            self.cue_started_at = Some(engine.now());
        } else {
            self.cue_started_at = None;
        }
    }

    fn tick(&mut self, engine: &mut GameEngine<C, R>, scene: &mut Scene) -> Option<TrialOutcome> {
        if self.cue_started_at.is_none() {
            let gate_open = self
                .trial_started_at
                .is_some_and(|t| engine.elapsed_secs(t) >= engine.config.initial_cue_delay_secs);
            if gate_open {
                engine.cues_mut().play(CUE_START);
                self.cue_started_at = Some(engine.now());
            }
        }

        let state = self.ball_state();
        let pressed = self.selected_index().is_some();

        match state {
            BallState::Start => {
                // Launch only after the jittered delay since the cue began.
                if let Some(cue_at) = self.cue_started_at {
                    if engine.elapsed_secs(cue_at) > self.jitter_secs {
                        engine.cues_mut().stop(CUE_START);
                        engine.cues_mut().play(CUE_LAUNCH);
                        self.fall_started_at = Some(engine.now());
                        if let Some(ball) = self.ball.as_mut() {
                            ball.state = BallState::Fall;
                        }
                        let row = self.build_row(engine, None);
                        engine.store_row(row);
                    }
                }
            }
            BallState::Fall => {
                let t = self
                    .fall_started_at
                    .map_or(0.0, |at| engine.elapsed_secs(at));
                let (gravity, scale) = (engine.config.gravity, engine.scale());
                if let Some(ball) = self.ball.as_mut() {
                    ball.advance(gravity, t as f32, scale);
                }
                if pressed {
                    self.enter_hit(engine);
                } else if t >= engine.config.fall_to_house_secs {
                    if let Some(ball) = self.ball.as_mut() {
                        ball.state = BallState::HitHouse;
                    }
                }
            }
            BallState::HitHouse => {
                if pressed {
                    // The participant's reaction preempts the timer.
                    self.enter_hit(engine);
                } else if self
                    .fall_started_at
                    .is_some_and(|at| engine.elapsed_secs(at) >= engine.config.house_timeout_secs)
                {
                    self.enter_hit(engine);
                }
            }
            BallState::Hit => {
                let settled = self
                    .settle_started_at
                    .is_some_and(|at| engine.elapsed_secs(at) >= engine.config.settle_secs);
                if settled {
                    let correct = self.correct_index(&engine.config.correct_window_lookup);
                    let matched = self.selected_index() == Some(correct);
                    engine
                        .cues_mut()
                        .play(if matched { CUE_CATCH } else { CUE_FAIL });
                    self.matched = Some(matched);
                    self.outcome_started_at = Some(engine.now());
                    if let Some(ball) = self.ball.as_mut() {
                        ball.state = BallState::HitTarget;
                    }
                }
            }
            BallState::HitTarget => {
                let displayed = self
                    .outcome_started_at
                    .is_some_and(|at| engine.elapsed_secs(at) >= engine.config.outcome_display_secs);
                if displayed {
                    return Some(self.outcome());
                }
            }
        }

        self.draw(engine, scene);
        None
    }

    fn final_row(&self, engine: &GameEngine<C, R>, outcome: TrialOutcome) -> ExportRow {
        self.build_row(engine, Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::engine::Bounds;
    use ludex_timing::ManualClock;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    type Engine = GameEngine<ManualClock, Pcg32>;
    type Variant = DiscreteButtonSpatial<u64>;

    fn engine(clock: ManualClock) -> Engine {
        GameEngine::new(
            GameConfig::default(),
            clock,
            Pcg32::seed_from_u64(3),
            Bounds { w: 1024.0, h: 768.0 },
        )
        .unwrap()
    }

    fn tick(variant: &mut Variant, engine: &mut Engine) -> Option<TrialOutcome> {
        let mut scene = Scene::default();
        GameVariant::tick(variant, engine, &mut scene)
    }

    fn start_trial(params: TrialParams) -> (Variant, Engine, ManualClock) {
        let clock = ManualClock::new();
        let mut engine = engine(clock.clone());
        let mut variant = Variant::new();
        variant.init_trial(&mut engine, params, TrialType::Scheduled);
        (variant, engine, clock)
    }

    /// Drive a freshly-initialized round-0 trial into `Fall`.
    fn drive_to_fall(variant: &mut Variant, engine: &mut Engine, clock: &ManualClock) {
        clock.advance_secs(2.5); // initial cue gate
        tick(variant, engine);
        clock.advance_secs(1.6); // past the maximum jitter
        tick(variant, engine);
        assert_eq!(variant.ball_state(), BallState::Fall);
    }

    #[test]
    fn ball_never_launches_before_jitter() {
        let (mut variant, mut engine, clock) = start_trial(TrialParams {
            obstruction: 1,
            velocity: 1,
        });
        // Cue has not started yet: initial delay still running.
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::Start);
        clock.advance_secs(2.5);
        tick(&mut variant, &mut engine);
        // Cue started; minimum jitter is 0.5 s, so 0.4 s is too early.
        clock.advance_secs(0.4);
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::Start);
        // Past the maximum jitter the launch must have happened.
        clock.advance_secs(1.2);
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::Fall);
    }

    #[test]
    fn press_during_fall_preempts_to_hit() {
        let (mut variant, mut engine, clock) = start_trial(TrialParams {
            obstruction: 2,
            velocity: 2,
        });
        drive_to_fall(&mut variant, &mut engine, &clock);
        variant.key_down(GameKey::Middle);
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::Hit);
    }

    #[test]
    fn press_during_hit_house_preempts_timeout() {
        let (mut variant, mut engine, clock) = start_trial(TrialParams {
            obstruction: 2,
            velocity: 2,
        });
        drive_to_fall(&mut variant, &mut engine, &clock);
        clock.advance_secs(0.6); // into the intermediate zone
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::HitHouse);
        variant.key_down(GameKey::Lower);
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::Hit);
    }

    #[test]
    fn hit_house_times_out_without_input() {
        let (mut variant, mut engine, clock) = start_trial(TrialParams {
            obstruction: 1,
            velocity: 1,
        });
        drive_to_fall(&mut variant, &mut engine, &clock);
        clock.advance_secs(0.6);
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::HitHouse);
        clock.advance_secs(2.0); // 2.6 s since launch, past the 2.5 s timeout
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::Hit);
        // Settle, evaluate, display, finish: no press means timed out.
        clock.advance_secs(0.5);
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::HitTarget);
        clock.advance_secs(3.0);
        let outcome = tick(&mut variant, &mut engine);
        assert_eq!(outcome, Some(TrialOutcome::TimedOut));
    }

    #[test]
    fn matching_press_exports_selected_equals_window() {
        // Velocity bucket 3 resolves to window index 0 via the lookup
        // table [2, 1, 0].
        let (mut variant, mut engine, clock) = start_trial(TrialParams {
            obstruction: 1,
            velocity: 3,
        });
        drive_to_fall(&mut variant, &mut engine, &clock);
        variant.key_down(GameKey::Upper);
        tick(&mut variant, &mut engine);
        clock.advance_secs(0.5);
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::HitTarget);
        clock.advance_secs(3.0);
        let outcome = tick(&mut variant, &mut engine);
        assert_eq!(outcome, Some(TrialOutcome::HitTarget));

        let row = variant.final_row(&engine, TrialOutcome::HitTarget);
        match row {
            ExportRow::DiscreteButtonSpatial {
                window,
                selected_button,
                ..
            } => {
                assert_eq!(window, 1);
                assert_eq!(selected_button, window);
            }
            other => panic!("unexpected row shape: {other:?}"),
        }
    }

    #[test]
    fn mismatched_press_is_a_miss() {
        let (mut variant, mut engine, clock) = start_trial(TrialParams {
            obstruction: 1,
            velocity: 3,
        });
        drive_to_fall(&mut variant, &mut engine, &clock);
        variant.key_down(GameKey::Lower); // correct is Upper
        tick(&mut variant, &mut engine);
        clock.advance_secs(0.5);
        tick(&mut variant, &mut engine);
        clock.advance_secs(3.0);
        assert_eq!(
            tick(&mut variant, &mut engine),
            Some(TrialOutcome::Missed)
        );
    }

    #[test]
    fn presses_ignored_after_evaluation_starts() {
        let (mut variant, mut engine, clock) = start_trial(TrialParams {
            obstruction: 1,
            velocity: 3,
        });
        drive_to_fall(&mut variant, &mut engine, &clock);
        variant.key_down(GameKey::Upper);
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::Hit);
        variant.key_down(GameKey::Lower);
        assert_eq!(variant.selected_index(), Some(0));
    }

    #[test]
    fn last_press_wins_before_evaluation() {
        let (mut variant, mut engine, clock) = start_trial(TrialParams {
            obstruction: 1,
            velocity: 1,
        });
        drive_to_fall(&mut variant, &mut engine, &clock);
        variant.key_down(GameKey::Upper);
        variant.key_down(GameKey::Middle);
        assert_eq!(variant.selected_index(), Some(1));
    }

    #[test]
    fn init_trial_fully_resets_state() {
        let (mut variant, mut engine, clock) = start_trial(TrialParams {
            obstruction: 1,
            velocity: 1,
        });
        drive_to_fall(&mut variant, &mut engine, &clock);
        variant.key_down(GameKey::Upper);
        tick(&mut variant, &mut engine);

        variant.init_trial(
            &mut engine,
            TrialParams {
                obstruction: 3,
                velocity: 2,
            },
            TrialType::Scheduled,
        );
        assert_eq!(variant.ball_state(), BallState::Start);
        assert_eq!(variant.selected_index(), None);
        // Calling it twice in a row leaks nothing either.
        variant.init_trial(
            &mut engine,
            TrialParams {
                obstruction: 3,
                velocity: 2,
            },
            TrialType::Scheduled,
        );
        assert_eq!(variant.ball_state(), BallState::Start);
        assert_eq!(variant.selected_index(), None);
    }
}
