use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ludex_engine::{variants, GameConfig};
use serde::Deserialize;

/// Which mini-game this run presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    DiscreteButtonSpatial,
    FeedCroc,
}

/// One image asset bound to a variant's asset slot.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetEntry {
    pub id: usize,
    pub path: PathBuf,
}

/// One audio cue slot with the duration of its recording.
#[derive(Debug, Clone, Deserialize)]
pub struct CueEntry {
    pub id: usize,
    pub secs: f64,
}

/// Top-level run configuration, read from a JSON file when one is given
/// on the command line.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub game_type: GameType,
    /// Fixed seed for a reproducible trial ordering. Drawn fresh when
    /// absent.
    pub seed: Option<u64>,
    pub game: GameConfig,
    pub assets: Vec<AssetEntry>,
    pub cues: Vec<CueEntry>,
    pub font: Option<PathBuf>,
    pub font_size: f32,
    pub output: PathBuf,
    /// Fixed (obstruction, velocity) pairs for a practice run instead of
    /// the balanced randomized schedule.
    pub demo_pairs: Option<Vec<(u8, u8)>>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            game_type: GameType::DiscreteButtonSpatial,
            seed: None,
            game: GameConfig::default(),
            assets: Vec::new(),
            cues: Vec::new(),
            font: None,
            font_size: 36.0,
            output: PathBuf::from("ludex-results.json"),
            demo_pairs: None,
        }
    }
}

impl StudyConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading study config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing study config {}", path.display()))
    }

    /// Cue durations to use when the config names none. The ids follow
    /// the active variant's cue slots.
    pub fn cue_entries(&self) -> Vec<CueEntry> {
        if !self.cues.is_empty() {
            return self.cues.clone();
        }
        let defaults: &[(usize, f64)] = match self.game_type {
            GameType::DiscreteButtonSpatial => &[
                (variants::discrete_button_spatial::CUE_START, 2.0),
                (variants::discrete_button_spatial::CUE_LAUNCH, 0.5),
                (variants::discrete_button_spatial::CUE_CATCH, 1.0),
                (variants::discrete_button_spatial::CUE_FAIL, 1.0),
            ],
            GameType::FeedCroc => &[
                (variants::feed_croc::CUE_RATTLE, 2.0),
                (variants::feed_croc::CUE_BOUNCE, 0.3),
                (variants::feed_croc::CUE_SLURP, 1.0),
                (variants::feed_croc::CUE_FAIL, 1.0),
            ],
        };
        defaults
            .iter()
            .map(|&(id, secs)| CueEntry { id, secs })
            .collect()
    }
}
