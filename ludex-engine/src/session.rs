use ludex_core::row::TrialType;
use ludex_core::{ExportRow, GameError, GameKey, Scene, TrialOutcome};
use ludex_timing::Clock;
use rand::Rng;

use crate::config::GameConfig;
use crate::engine::{Bounds, GameEngine};
use crate::schedule::{TrialParams, TrialSchedule};

/// Discrete key input, independent of the clock and RNG driving the
/// session. Split out so a concrete variant's key handling resolves
/// without naming either type parameter.
pub trait GameInput {
    /// Discrete key press. Honored only in the states the variant's
    /// input window allows; races outside it are ignored by design.
    fn key_down(&mut self, key: GameKey);
}

/// A mini-game composed over the engine's capability set.
///
/// The engine supplies trajectory/collision/timer/cue services; the
/// variant supplies geometry, its per-trial state machine, input
/// handling and its export row shape.
pub trait GameVariant<C: Clock, R: Rng>: GameInput {
    fn name(&self) -> &'static str;

    /// Reset all per-trial state for a fresh round. Must fully overwrite
    /// ball/target/pressed state; nothing leaks from the previous trial.
    fn init_trial(
        &mut self,
        engine: &mut GameEngine<C, R>,
        params: TrialParams,
        trial_type: TrialType,
    );

    /// One frame: position update, collision check, state transition,
    /// draw, in that order. Returns the outcome once the trial ends.
    fn tick(&mut self, engine: &mut GameEngine<C, R>, scene: &mut Scene) -> Option<TrialOutcome>;

    /// Continuous input device position (vertical), for paddle variants.
    fn pointer_moved(&mut self, _engine: &GameEngine<C, R>, _y: f32) {}

    /// Final data row for the trial that just ended.
    fn final_row(&self, engine: &GameEngine<C, R>, outcome: TrialOutcome) -> ExportRow;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub current: usize,
    pub total: usize,
}

/// Drives one game variant through its trial sequence.
///
/// Created on the participant's play action; trials run strictly one at
/// a time, and each `init_trial` overwrites the previous trial's state
/// and silences its cues before new media is attached.
pub struct GameSession<V, C, R>
where
    V: GameVariant<C, R>,
    C: Clock,
    R: Rng,
{
    engine: GameEngine<C, R>,
    variant: V,
    schedule: TrialSchedule,
    started: bool,
    complete: bool,
}

impl<V, C, R> GameSession<V, C, R>
where
    V: GameVariant<C, R>,
    C: Clock,
    R: Rng,
{
    /// Session with a balanced randomized schedule drawn from the
    /// config's catalogs. Configuration errors surface here, before any
    /// trial starts.
    pub fn new(
        config: GameConfig,
        variant: V,
        clock: C,
        mut rng: R,
        canvas: Bounds,
    ) -> Result<Self, GameError> {
        let schedule = TrialSchedule::balanced(&config.obstructions, &config.velocities, &mut rng)?;
        let engine = GameEngine::new(config, clock, rng, canvas)?;
        Ok(Self {
            engine,
            variant,
            schedule,
            started: false,
            complete: false,
        })
    }

    /// Session with an explicit schedule (demo trials).
    pub fn with_schedule(
        config: GameConfig,
        variant: V,
        clock: C,
        rng: R,
        canvas: Bounds,
        schedule: TrialSchedule,
    ) -> Result<Self, GameError> {
        if schedule.is_empty() {
            return Err(GameError::config("schedule must contain at least one trial"));
        }
        let engine = GameEngine::new(config, clock, rng, canvas)?;
        Ok(Self {
            engine,
            variant,
            schedule,
            started: false,
            complete: false,
        })
    }

    /// Begin the first trial.
    pub fn start(&mut self) {
        if !self.started {
            self.started = true;
            log::info!(
                "{}: starting session of {} trials",
                self.variant.name(),
                self.schedule.len()
            );
            self.begin_trial();
        }
    }

    fn begin_trial(&mut self) {
        // Silence the previous trial's cues before new media attaches.
        self.engine.cues_mut().stop_all();
        let Some(params) = self.schedule.get(self.engine.round()) else {
            self.complete = true;
            return;
        };
        log::debug!(
            "trial {}: obstruction {} velocity {}",
            self.engine.round(),
            params.obstruction,
            params.velocity
        );
        self.variant
            .init_trial(&mut self.engine, params, self.schedule.trial_type());
    }

    /// One animation frame. Never blocks; safe to call before assets are
    /// ready (draws degrade to skips).
    pub fn tick(&mut self, scene: &mut Scene) {
        if !self.started || self.complete {
            return;
        }
        self.engine.cues_mut().pump();
        if let Some(outcome) = self.variant.tick(&mut self.engine, scene) {
            self.finish_trial(outcome);
        }
    }

    /// Mark the active trial complete, store its final row and either
    /// advance to the next trial or end the session.
    fn finish_trial(&mut self, outcome: TrialOutcome) {
        let row = self.variant.final_row(&self.engine, outcome);
        self.engine.store_row(row);
        self.engine.advance_round();
        if self.engine.round() >= self.schedule.len() {
            self.engine.cues_mut().stop_all();
            self.complete = true;
            log::info!("{}: session complete", self.variant.name());
        } else {
            self.begin_trial();
        }
    }

    pub fn key_down(&mut self, key: GameKey) {
        if self.started && !self.complete {
            self.variant.key_down(key);
        }
    }

    pub fn pointer_moved(&mut self, y: f32) {
        if self.started && !self.complete {
            self.variant.pointer_moved(&self.engine, y);
        }
    }

    pub fn resize(&mut self, canvas: Bounds) {
        self.engine.resize(canvas);
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            current: self.engine.round().min(self.schedule.len()),
            total: self.schedule.len(),
        }
    }

    /// The ordered export sequence accumulated so far.
    pub fn rows(&self) -> &[ExportRow] {
        self.engine.rows()
    }

    pub fn engine(&self) -> &GameEngine<C, R> {
        &self.engine
    }

    /// Cue registry, for the host to attach audio before `start`.
    pub fn cues_mut(&mut self) -> &mut crate::engine::CueBank {
        self.engine.cues_mut()
    }

    #[cfg(test)]
    pub(crate) fn variant(&self) -> &V {
        &self.variant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ludex_core::BallState;
    use ludex_timing::ManualClock;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use crate::variants::discrete_button_spatial::DiscreteButtonSpatial;

    fn session() -> (
        GameSession<DiscreteButtonSpatial<u64>, ManualClock, Pcg32>,
        ManualClock,
    ) {
        let clock = ManualClock::new();
        let session = GameSession::new(
            GameConfig::default(),
            DiscreteButtonSpatial::new(),
            clock.clone(),
            Pcg32::seed_from_u64(11),
            Bounds { w: 1024.0, h: 768.0 },
        )
        .unwrap();
        (session, clock)
    }

    #[test]
    fn empty_catalogs_abort_construction() {
        let config = GameConfig {
            obstructions: vec![],
            velocities: vec![],
            ..GameConfig::default()
        };
        let err = GameSession::new(
            config,
            DiscreteButtonSpatial::new(),
            ManualClock::new(),
            Pcg32::seed_from_u64(0),
            Bounds { w: 1024.0, h: 768.0 },
        )
        .err()
        .unwrap();
        assert!(matches!(err, GameError::Config(_)));
    }

    #[test]
    fn tick_before_start_is_a_noop() {
        let (mut session, _clock) = session();
        let mut scene = Scene::default();
        session.tick(&mut scene);
        assert!(session.rows().is_empty());
        assert_eq!(session.progress().current, 0);
    }

    #[test]
    fn session_runs_all_trials_to_completion() {
        let (mut session, clock) = session();
        session.start();
        let mut scene = Scene::default();
        // Generous upper bound: every trial resolves via timeouts alone.
        for _ in 0..2000 {
            if session.is_complete() {
                break;
            }
            scene.clear();
            session.tick(&mut scene);
            clock.advance_secs(0.1);
        }
        assert!(session.is_complete());
        assert_eq!(session.progress().current, 9);
        // Final rows are ordered by trial sequence, one terminal row each.
        let finals: Vec<usize> = session
            .rows()
            .iter()
            .filter(|r| r.outcome().is_some())
            .map(|r| r.trial())
            .collect();
        assert_eq!(finals, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn trial_isolation_after_advance() {
        let (mut session, clock) = session();
        session.start();
        let mut scene = Scene::default();
        session.key_down(GameKey::Upper);
        // Run out the first trial entirely on timeouts.
        loop {
            scene.clear();
            session.tick(&mut scene);
            if session.progress().current == 1 || session.is_complete() {
                break;
            }
            clock.advance_secs(0.1);
        }
        // The new trial starts with a fresh ball and no pressed keys.
        assert_eq!(session.variant().ball_state(), BallState::Start);
        assert!(session.variant().selected_index().is_none());
    }
}
