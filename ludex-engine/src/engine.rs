use ludex_core::{AudioCue, ExportRow, GameError};
use ludex_timing::Clock;
use rand::Rng;

use crate::config::GameConfig;

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub w: f32,
    pub h: f32,
}

/// Registered audio cues, polled from the loop.
///
/// A cue that fails to start stays wanted and is retried on the next
/// pump rather than aborting the trial. An unregistered id degrades to a
/// no-op that reports itself ended, so a missing asset never blocks a
/// state transition.
#[derive(Default)]
pub struct CueBank {
    slots: Vec<Option<CueSlot>>,
}

struct CueSlot {
    cue: Box<dyn AudioCue>,
    wanted: bool,
}

impl CueBank {
    pub fn register(&mut self, id: usize, cue: Box<dyn AudioCue>) {
        if self.slots.len() <= id {
            self.slots.resize_with(id + 1, || None);
        }
        self.slots[id] = Some(CueSlot { cue, wanted: false });
    }

    pub fn play(&mut self, id: usize) {
        match self.slots.get_mut(id).and_then(Option::as_mut) {
            Some(slot) => slot.wanted = true,
            None => log::debug!("cue {id} not registered, skipping play"),
        }
    }

    pub fn stop(&mut self, id: usize) {
        if let Some(slot) = self.slots.get_mut(id).and_then(Option::as_mut) {
            slot.wanted = false;
            slot.cue.stop();
        }
    }

    pub fn stop_all(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.wanted = false;
            slot.cue.stop();
        }
    }

    pub fn playing(&self, id: usize) -> bool {
        self.slots
            .get(id)
            .and_then(Option::as_ref)
            .is_some_and(|slot| slot.cue.is_playing())
    }

    /// True once the cue ran to completion. Missing cues count as ended.
    pub fn ended(&self, id: usize) -> bool {
        match self.slots.get(id).and_then(Option::as_ref) {
            Some(slot) => slot.cue.has_ended(),
            None => true,
        }
    }

    /// Start wanted cues, retrying earlier failures.
    pub fn pump(&mut self) {
        for (id, slot) in self.slots.iter_mut().enumerate() {
            let Some(slot) = slot else { continue };
            if slot.wanted && !slot.cue.is_playing() && !slot.cue.has_ended() {
                if let Err(e) = slot.cue.play() {
                    log::warn!("cue {id} failed to start, will retry: {e}");
                }
            }
        }
    }
}

/// Shared physics/timing/media services composed into every game variant.
///
/// Owns the clock, the RNG, the configuration, the round counter and the
/// ordered export sequence. Variants supply their own geometry, state
/// machine and input handling on top.
pub struct GameEngine<C: Clock, R: Rng> {
    pub clock: C,
    pub rng: R,
    pub config: GameConfig,
    canvas: Bounds,
    scale: f32,
    round: usize,
    rows: Vec<ExportRow>,
    cues: CueBank,
}

impl<C: Clock, R: Rng> GameEngine<C, R> {
    pub fn new(config: GameConfig, clock: C, rng: R, canvas: Bounds) -> Result<Self, GameError> {
        if canvas.w <= 0.0 || canvas.h <= 0.0 {
            return Err(GameError::config("canvas dimensions must be positive"));
        }
        let scale = canvas.h * config.height_scale;
        Ok(Self {
            clock,
            rng,
            config,
            canvas,
            scale,
            round: 0,
            rows: Vec::new(),
            cues: CueBank::default(),
        })
    }

    pub fn canvas(&self) -> Bounds {
        self.canvas
    }

    /// Pixels per scale unit for the current viewport.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Recompute the scale factor after a viewport change.
    pub fn resize(&mut self, canvas: Bounds) {
        self.canvas = canvas;
        self.scale = canvas.h * self.config.height_scale;
    }

    /// Current trial index, starting at 0.
    pub fn round(&self) -> usize {
        self.round
    }

    pub fn advance_round(&mut self) {
        self.round += 1;
    }

    /// Elapsed seconds since a reference timestamp; the sole timing
    /// primitive driving state transitions.
    pub fn elapsed_secs(&self, since: C::Timestamp) -> f64 {
        self.clock.elapsed_secs(since)
    }

    pub fn now(&self) -> C::Timestamp {
        self.clock.now()
    }

    /// Draw this trial's cue-to-launch jitter from the configured range.
    pub fn draw_jitter(&mut self) -> f64 {
        let (lo, hi) = self.config.jitter_range_secs;
        self.rng.random_range(lo..=hi)
    }

    /// Append one row to the ordered export sequence.
    pub fn store_row(&mut self, row: ExportRow) {
        log::debug!("export row for trial {}", row.trial());
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ExportRow] {
        &self.rows
    }

    pub fn cues(&self) -> &CueBank {
        &self.cues
    }

    pub fn cues_mut(&mut self) -> &mut CueBank {
        &mut self.cues
    }
}
