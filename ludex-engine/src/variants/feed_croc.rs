use glam::Vec2;
use ludex_core::row::TrialType;
use ludex_core::{AssetId, BallState, ExportRow, GameKey, Scene, TrialOutcome};
use ludex_timing::Clock;
use rand::Rng;

use crate::engine::GameEngine;
use crate::physics::{Ball, Paddle, paddle_bounce, wall_collision};
use crate::schedule::TrialParams;
use crate::session::{GameInput, GameVariant};

// Image asset slots the host preloads for this game.
pub const ASSET_BALL: AssetId = 0;
pub const ASSET_CROC: AssetId = 1;
pub const ASSET_CROC_DONE: AssetId = 2;

// Audio cue slots.
pub const CUE_RATTLE: usize = 0;
pub const CUE_BOUNCE: usize = 1;
pub const CUE_SLURP: usize = 2;
pub const CUE_FAIL: usize = 3;

// Preset launch velocities in scale units per second; the velocity
// bucket picks one, so the balanced schedule covers all of them.
const TRAJECTORIES: [Vec2; 4] = [
    Vec2::new(3.9, -6.8),
    Vec2::new(3.7, -7.2),
    Vec2::new(3.5, -7.7),
    Vec2::new(3.6, -7.6),
];

const PADDLE_COLOR: [u8; 4] = [255, 255, 255, 255];
const BOX_COLOR: [u8; 4] = [30, 60, 160, 255];
const BALL_RADIUS_PX: f32 = 10.0;

/// Feed-the-crocodile: the participant bounces the ball off a paddle
/// into the crocodile's mouth. Success is reaching the mouth window;
/// leaving the canvas is a miss. The paddle must sit back in its start
/// box before the next trial's cue plays.
pub struct FeedCroc<Ts> {
    params: TrialParams,
    trial_type: TrialType,
    ball: Option<Ball>,
    paddle: Paddle,
    cue_requested: bool,
    fall_started_at: Option<Ts>,
    /// Flight time accumulated before the current anchor (bounces reset
    /// the anchor but not the trial clock).
    flight_base_secs: f64,
    reached_target: bool,
}

impl<Ts: Copy> FeedCroc<Ts> {
    pub fn new() -> Self {
        Self {
            params: TrialParams {
                obstruction: 1,
                velocity: 1,
            },
            trial_type: TrialType::Scheduled,
            ball: None,
            paddle: Paddle {
                pos: Vec2::ZERO,
                dims: Vec2::ZERO,
            },
            cue_requested: false,
            fall_started_at: None,
            flight_base_secs: 0.0,
            reached_target: false,
        }
    }

    pub fn ball_state(&self) -> BallState {
        self.ball
            .as_ref()
            .map_or(BallState::Start, |ball| ball.state)
    }

    pub fn reached_target(&self) -> bool {
        self.reached_target
    }

    fn launch_velocity(&self) -> Vec2 {
        let bucket = (self.params.velocity.max(1) as usize - 1).min(TRAJECTORIES.len() - 1);
        TRAJECTORIES[bucket]
    }

    fn paddle_width(canvas_w: f32) -> f32 {
        canvas_w / 20.0
    }

    fn paddle_home(canvas_w: f32, canvas_h: f32) -> Vec2 {
        let pw = Self::paddle_width(canvas_w);
        let ph = canvas_w / 15.0;
        Vec2::new(pw * 10.0, canvas_h / 2.5 + canvas_h / 2.0 - ph)
    }

    fn ball_start(canvas_w: f32, canvas_h: f32) -> Vec2 {
        let pw = Self::paddle_width(canvas_w);
        Vec2::new(pw * 5.0 + 20.0, canvas_h - pw * 2.0)
    }

    fn target_rect(canvas_w: f32) -> (Vec2, Vec2) {
        let side = canvas_w / 5.0;
        (
            Vec2::new(canvas_w - canvas_w / 3.5, 10.0),
            Vec2::new(side, side),
        )
    }

    /// Paddle back in its start box, required before each launch.
    fn paddle_at_home(&self, canvas_w: f32, canvas_h: f32) -> bool {
        let home = Self::paddle_home(canvas_w, canvas_h);
        (self.paddle.pos.y - home.y).abs() < self.paddle.dims.y * 2.0
    }

    /// Has the ball entered the mouth window of the crocodile.
    fn mouth_collision(&self, canvas_w: f32) -> bool {
        let Some(ball) = self.ball.as_ref() else {
            return false;
        };
        let (pos, dims) = Self::target_rect(canvas_w);
        ball.pos.y < pos.y + dims.y
            && ball.pos.y > pos.y + dims.y / 1.6
            && ball.pos.x > pos.x + dims.x * 0.2
            && ball.pos.x < pos.x + dims.x * 0.4
    }

    fn build_row<C, R>(&self, engine: &GameEngine<C, R>, outcome: Option<TrialOutcome>) -> ExportRow
    where
        C: Clock<Timestamp = Ts>,
        R: Rng,
    {
        let scale = engine.scale();
        let unit = self
            .ball
            .as_ref()
            .map_or(Vec2::ZERO, |ball| ball.unit_pos(scale));
        ExportRow::FeedCroc {
            trial: engine.round(),
            trial_type: self.trial_type,
            ball_position_x: unit.x,
            ball_position_y: unit.y,
            paddle_position_x: self.paddle.pos.x / scale,
            paddle_position_y: self.paddle.pos.y / scale,
            timestamp: self
                .fall_started_at
                .map_or(0.0, |at| engine.elapsed_secs(at)),
            outcome,
        }
    }

    fn draw<C, R>(&self, engine: &GameEngine<C, R>, scene: &mut Scene)
    where
        C: Clock<Timestamp = Ts>,
        R: Rng,
    {
        let canvas = engine.canvas();
        let home = Self::paddle_home(canvas.w, canvas.h);
        let (croc_pos, croc_dims) = Self::target_rect(canvas.w);

        // Start box outline area, then paddle, then target.
        scene.rect(
            home.x,
            home.y - self.paddle.dims.y * 4.0,
            self.paddle.dims.x,
            self.paddle.dims.y * 5.0,
            BOX_COLOR,
        );
        scene.rect(
            self.paddle.pos.x,
            self.paddle.pos.y,
            self.paddle.dims.x,
            self.paddle.dims.y,
            PADDLE_COLOR,
        );
        scene.sprite(
            if self.reached_target {
                ASSET_CROC_DONE
            } else {
                ASSET_CROC
            },
            croc_pos.x,
            croc_pos.y,
            croc_dims.x,
            croc_dims.y,
        );
        if let Some(ball) = self.ball.as_ref() {
            scene.sprite(
                ASSET_BALL,
                ball.pos.x - ball.radius,
                ball.pos.y - ball.radius,
                ball.radius * 2.0,
                ball.radius * 2.0,
            );
        }
    }
}

impl<Ts: Copy> Default for FeedCroc<Ts> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ts> GameInput for FeedCroc<Ts> {
    fn key_down(&mut self, _key: GameKey) {
        // No discrete input in this game; the paddle is the response.
    }
}

impl<C, R> GameVariant<C, R> for FeedCroc<<C as Clock>::Timestamp>
where
    C: Clock,
    R: Rng,
{
    fn name(&self) -> &'static str {
        "feed_croc"
    }

    fn init_trial(
        &mut self,
        engine: &mut GameEngine<C, R>,
        params: TrialParams,
        trial_type: TrialType,
    ) {
        let canvas = engine.canvas();
        let pw = Self::paddle_width(canvas.w);
        self.params = params;
        self.trial_type = trial_type;
        self.paddle.dims = Vec2::new(pw * 1.5, (canvas.w / 15.0) / 5.0);
        // Keep the participant's paddle where it is between trials; only
        // the first trial starts it in the box.
        if self.ball.is_none() {
            self.paddle.pos = Self::paddle_home(canvas.w, canvas.h);
        }
        self.ball = Some(Ball::new(
            Self::ball_start(canvas.w, canvas.h) / engine.scale(),
            self.launch_velocity(),
            BALL_RADIUS_PX,
            engine.config.restitution,
            engine.scale(),
        ));
        self.cue_requested = false;
        self.fall_started_at = None;
        self.flight_base_secs = 0.0;
        self.reached_target = false;
    }

    fn tick(&mut self, engine: &mut GameEngine<C, R>, scene: &mut Scene) -> Option<TrialOutcome> {
        let canvas = engine.canvas();
        let scale = engine.scale();
        let gravity = engine.config.paddle_gravity;

        match self.ball_state() {
            BallState::Start => {
                // Wait for the paddle to return home, then run the cue;
                // the ball launches when the cue finishes.
                if !self.cue_requested {
                    if self.paddle_at_home(canvas.w, canvas.h) {
                        engine.cues_mut().play(CUE_RATTLE);
                        self.cue_requested = true;
                    }
                } else if engine.cues().ended(CUE_RATTLE) {
                    self.fall_started_at = Some(engine.now());
                    if let Some(ball) = self.ball.as_mut() {
                        ball.state = BallState::Fall;
                    }
                    let row = self.build_row(engine, None);
                    engine.store_row(row);
                }
            }
            BallState::Fall => {
                let t = self
                    .fall_started_at
                    .map_or(0.0, |at| engine.elapsed_secs(at)) as f32;
                let lift = engine.config.paddle_lift;
                let mut bounced = false;
                if let Some(ball) = self.ball.as_mut() {
                    ball.advance(gravity, t, scale);
                    bounced = paddle_bounce(ball, &self.paddle, gravity, t, lift, scale);
                }
                if bounced {
                    engine.cues_mut().play(CUE_BOUNCE);
                    self.flight_base_secs += f64::from(t);
                    self.fall_started_at = Some(engine.now());
                }

                if self.mouth_collision(canvas.w) {
                    self.reached_target = true;
                    engine.cues_mut().play(CUE_SLURP);
                    self.draw(engine, scene);
                    return Some(TrialOutcome::HitTarget);
                }
                let out = self
                    .ball
                    .as_ref()
                    .is_some_and(|ball| wall_collision(ball, canvas.w, canvas.h));
                if out {
                    engine.cues_mut().play(CUE_FAIL);
                    self.draw(engine, scene);
                    return Some(TrialOutcome::Missed);
                }
                if self.flight_base_secs + f64::from(t) >= engine.config.max_flight_secs {
                    self.draw(engine, scene);
                    return Some(TrialOutcome::TimedOut);
                }
            }
            // The other states belong to the prediction game.
            _ => {}
        }

        self.draw(engine, scene);
        None
    }

    fn pointer_moved(&mut self, engine: &GameEngine<C, R>, y: f32) {
        self.paddle.track(y, engine.canvas().h);
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
    use ludex_core::SilentCue;
    use ludex_timing::ManualClock;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    type Engine = GameEngine<ManualClock, Pcg32>;
    type Variant = FeedCroc<u64>;

    fn setup(velocity: u8) -> (Variant, Engine, ManualClock) {
        let clock = ManualClock::new();
        let mut engine = GameEngine::new(
            GameConfig::default(),
            clock.clone(),
            Pcg32::seed_from_u64(5),
            Bounds { w: 1024.0, h: 768.0 },
        )
        .unwrap();
        let mut variant = Variant::new();
        variant.init_trial(
            &mut engine,
            TrialParams {
                obstruction: 1,
                velocity,
            },
            TrialType::Scheduled,
        );
        (variant, engine, clock)
    }

    fn tick(variant: &mut Variant, engine: &mut Engine) -> Option<TrialOutcome> {
        let mut scene = Scene::default();
        GameVariant::tick(variant, engine, &mut scene)
    }

    #[test]
    fn launch_waits_for_cue_end() {
        let (mut variant, mut engine, _clock) = setup(2);
        // A registered cue that has not ended holds the ball in Start.
        engine.cues_mut().register(CUE_RATTLE, Box::new(SilentCue::new()));
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::Start);
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::Start);
    }

    #[test]
    fn missing_cue_degrades_to_immediate_launch() {
        let (mut variant, mut engine, _clock) = setup(2);
        tick(&mut variant, &mut engine); // requests the cue
        tick(&mut variant, &mut engine); // unregistered cue counts as ended
        assert_eq!(variant.ball_state(), BallState::Fall);
    }

    #[test]
    fn wall_exit_is_a_miss() {
        // Bucket 3's arc crosses the mouth column above the band, so with
        // the paddle parked away the ball sails off the right edge.
        let (mut variant, mut engine, clock) = setup(3);
        tick(&mut variant, &mut engine);
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::Fall);
        variant.pointer_moved(&engine, 0.0);
        let mut outcome = None;
        for _ in 0..400 {
            clock.advance_secs(0.05);
            outcome = tick(&mut variant, &mut engine);
            if outcome.is_some() {
                break;
            }
        }
        assert_eq!(outcome, Some(TrialOutcome::Missed));
        assert!(!variant.reached_target());
    }

    #[test]
    fn arc_into_the_mouth_hits_target() {
        // Bucket 2's launch arc passes through the mouth band while the
        // paddle sits in its start box: the success path needs no bounce.
        let (mut variant, mut engine, clock) = setup(2);
        tick(&mut variant, &mut engine);
        tick(&mut variant, &mut engine);
        assert_eq!(variant.ball_state(), BallState::Fall);
        let mut outcome = None;
        for _ in 0..200 {
            clock.advance_secs(0.01);
            outcome = tick(&mut variant, &mut engine);
            if outcome.is_some() {
                break;
            }
        }
        assert_eq!(outcome, Some(TrialOutcome::HitTarget));
        assert!(variant.reached_target());
    }

    #[test]
    fn key_presses_are_ignored() {
        let (mut variant, _engine, _clock) = setup(1);
        variant.key_down(GameKey::Upper);
        assert_eq!(variant.ball_state(), BallState::Start);
        assert!(!variant.reached_target());
    }

    #[test]
    fn final_row_carries_paddle_and_ball_positions() {
        let (mut variant, mut engine, clock) = setup(2);
        tick(&mut variant, &mut engine);
        tick(&mut variant, &mut engine);
        clock.advance_secs(0.2);
        tick(&mut variant, &mut engine);
        let row = variant.final_row(&engine, TrialOutcome::Missed);
        match row {
            ExportRow::FeedCroc {
                paddle_position_x,
                ball_position_x,
                outcome,
                ..
            } => {
                assert!(paddle_position_x > 0.0);
                assert!(ball_position_x > 0.0);
                assert_eq!(outcome, Some(TrialOutcome::Missed));
            }
            other => panic!("unexpected row shape: {other:?}"),
        }
    }

    #[test]
    fn init_trial_resets_flight_state() {
        let (mut variant, mut engine, clock) = setup(2);
        tick(&mut variant, &mut engine);
        tick(&mut variant, &mut engine);
        clock.advance_secs(1.0);
        tick(&mut variant, &mut engine);
        variant.init_trial(
            &mut engine,
            TrialParams {
                obstruction: 1,
                velocity: 1,
            },
            TrialType::Scheduled,
        );
        assert_eq!(variant.ball_state(), BallState::Start);
        assert!(!variant.reached_target());
    }
}
