use serde::{Deserialize, Serialize};

use crate::state::TrialOutcome;

/// Whether a trial's parameters came from the balanced schedule or an
/// explicit demo list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialType {
    Scheduled,
    Demo,
}

/// One data record destined for the host's export sequence.
///
/// Rows are append-only and ordered by trial sequence. Column names keep
/// the study's original export vocabulary: `window` is the 1-based correct
/// window row, `selected_button` is 1..=3 for a pressed key and 4 for no
/// press.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game_type", rename_all = "snake_case")]
pub enum ExportRow {
    DiscreteButtonSpatial {
        trial: usize,
        trial_type: TrialType,
        window: u8,
        selected_button: u8,
        obstruction_number: u8,
        /// Ball position in scale-independent units.
        ball_position_x: f32,
        ball_position_y: f32,
        /// Seconds since the current trial's reference timestamp.
        timestamp: f64,
        outcome: Option<TrialOutcome>,
    },
    FeedCroc {
        trial: usize,
        trial_type: TrialType,
        ball_position_x: f32,
        ball_position_y: f32,
        paddle_position_x: f32,
        paddle_position_y: f32,
        timestamp: f64,
        outcome: Option<TrialOutcome>,
    },
}

impl ExportRow {
    /// Trial index the row belongs to.
    pub fn trial(&self) -> usize {
        match self {
            ExportRow::DiscreteButtonSpatial { trial, .. } => *trial,
            ExportRow::FeedCroc { trial, .. } => *trial,
        }
    }

    pub fn outcome(&self) -> Option<TrialOutcome> {
        match self {
            ExportRow::DiscreteButtonSpatial { outcome, .. } => *outcome,
            ExportRow::FeedCroc { outcome, .. } => *outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_tags_by_game_type() {
        let row = ExportRow::DiscreteButtonSpatial {
            trial: 3,
            trial_type: TrialType::Scheduled,
            window: 1,
            selected_button: 4,
            obstruction_number: 2,
            ball_position_x: 0.75,
            ball_position_y: 1.2,
            timestamp: 2.5,
            outcome: Some(TrialOutcome::TimedOut),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"game_type\":\"discrete_button_spatial\""));
        assert!(json.contains("\"selected_button\":4"));
        let back: ExportRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back.trial(), 3);
        assert_eq!(back.outcome(), Some(TrialOutcome::TimedOut));
    }
}
