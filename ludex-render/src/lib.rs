pub mod sprites;
pub mod surface;
pub mod text;

pub use sprites::SpriteStore;
pub use surface::SkiaSurface;
pub use text::TextPainter;
