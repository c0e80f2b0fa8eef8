pub mod discrete_button_spatial;
pub mod feed_croc;

pub use discrete_button_spatial::DiscreteButtonSpatial;
pub use feed_croc::FeedCroc;
