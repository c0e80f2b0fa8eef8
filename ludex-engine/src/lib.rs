pub mod config;
pub mod engine;
pub mod physics;
pub mod schedule;
pub mod session;
pub mod variants;

pub use config::GameConfig;
pub use engine::{Bounds, CueBank, GameEngine};
pub use physics::{Ball, Paddle};
pub use schedule::{TrialParams, TrialSchedule};
pub use session::{GameInput, GameSession, GameVariant, SessionProgress};
