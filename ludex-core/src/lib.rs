pub mod error;
pub mod media;
pub mod row;
pub mod scene;
pub mod state;

pub use error::GameError;
pub use media::{AudioCue, MediaState, SilentCue};
pub use row::{ExportRow, TrialType};
pub use scene::{AssetId, FillRect, Scene, Sprite};
pub use state::{BallState, GameKey, TrialOutcome};
