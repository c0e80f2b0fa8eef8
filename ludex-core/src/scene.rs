/// Stable identifier for a preloaded image asset.
pub type AssetId = usize;

/// One image blit: position and dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub asset: AssetId,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// One filled rectangle (paddle, boxes) in pixels, RGBA color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub color: [u8; 4],
}

/// Display list built by a game variant for one frame.
///
/// The variant describes what to draw; the renderer owns how. Sprites
/// whose asset is not ready are skipped, so a scene is valid to submit
/// before media finishes loading.
#[derive(Debug, Default)]
pub struct Scene {
    pub rects: Vec<FillRect>,
    pub sprites: Vec<Sprite>,
    pub label: Option<String>,
}

impl Scene {
    pub fn clear(&mut self) {
        self.rects.clear();
        self.sprites.clear();
        self.label = None;
    }

    pub fn sprite(&mut self, asset: AssetId, x: f32, y: f32, w: f32, h: f32) {
        self.sprites.push(Sprite { asset, x, y, w, h });
    }

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [u8; 4]) {
        self.rects.push(FillRect { x, y, w, h, color });
    }
}
