use ludex_core::GameError;
use ludex_core::row::TrialType;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Randomized parameters drawn for one trial. Immutable once drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialParams {
    /// Obstruction (shuttle) size class, 1-based.
    pub obstruction: u8,
    /// Velocity bucket, 1-based.
    pub velocity: u8,
}

/// The full trial sequence for a session.
///
/// The balanced constructor produces the shuffled full factorial of the
/// two catalogs: every (obstruction, velocity) combination appears
/// exactly once over the sequence, so every condition is seen equally
/// often. Per-trial coin flips would not satisfy the design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSchedule {
    pairs: Vec<TrialParams>,
    trial_type: TrialType,
}

impl TrialSchedule {
    /// Shuffled exhaustive pairing of `obstructions` x `velocities`.
    ///
    /// The catalogs must be equal-length and non-empty; anything else is
    /// a configuration error and the session must not start.
    pub fn balanced<R: Rng>(
        obstructions: &[u8],
        velocities: &[u8],
        rng: &mut R,
    ) -> Result<Self, GameError> {
        if obstructions.is_empty() || velocities.is_empty() {
            return Err(GameError::config(
                "obstruction and velocity catalogs must be non-empty",
            ));
        }
        if obstructions.len() != velocities.len() {
            return Err(GameError::config(format!(
                "catalog lengths differ: {} obstructions vs {} velocities",
                obstructions.len(),
                velocities.len()
            )));
        }

        let mut pairs: Vec<TrialParams> = obstructions
            .iter()
            .flat_map(|&obstruction| {
                velocities.iter().map(move |&velocity| TrialParams {
                    obstruction,
                    velocity,
                })
            })
            .collect();
        pairs.shuffle(rng);

        log::debug!("balanced schedule of {} trials drawn", pairs.len());
        Ok(Self {
            pairs,
            trial_type: TrialType::Scheduled,
        })
    }

    /// Explicit (obstruction, velocity) list for demo/instruction trials,
    /// played in the given order. Every pair must name entries from the
    /// configured catalogs.
    pub fn demo(
        pairs: &[(u8, u8)],
        obstructions: &[u8],
        velocities: &[u8],
    ) -> Result<Self, GameError> {
        if pairs.is_empty() {
            return Err(GameError::config("demo trial list must be non-empty"));
        }
        for &(obstruction, velocity) in pairs {
            if !obstructions.contains(&obstruction) || !velocities.contains(&velocity) {
                return Err(GameError::config(format!(
                    "demo pair ({obstruction}, {velocity}) outside the configured catalogs"
                )));
            }
        }
        Ok(Self {
            pairs: pairs
                .iter()
                .map(|&(obstruction, velocity)| TrialParams {
                    obstruction,
                    velocity,
                })
                .collect(),
            trial_type: TrialType::Demo,
        })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, trial: usize) -> Option<TrialParams> {
        self.pairs.get(trial).copied()
    }

    pub fn trial_type(&self) -> TrialType {
        self.trial_type
    }

    pub fn iter(&self) -> impl Iterator<Item = TrialParams> + '_ {
        self.pairs.iter().copied()
    }
}
