pub mod clock;

pub use clock::{Clock, LoopStats, ManualClock, MonotonicClock};
