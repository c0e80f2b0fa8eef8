use ludex_core::Scene;
use tiny_skia::{
    Color, FilterQuality, Paint, Pixmap, PixmapPaint, Rect, Transform,
};

use crate::sprites::SpriteStore;
use crate::text::TextPainter;

const BACKGROUND: Color = Color::BLACK;

/// Software canvas for one frame.
///
/// Kept opaque so the whole pipeline stays premultiplied and the final
/// copy into the display buffer is a straight memcpy.
pub struct SkiaSurface {
    canvas: Pixmap,
}

impl SkiaSurface {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        let mut canvas = Pixmap::new(width, height)?;
        canvas.fill(BACKGROUND);
        Some(Self { canvas })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(mut canvas) = Pixmap::new(width, height) {
            canvas.fill(BACKGROUND);
            self.canvas = canvas;
        }
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Draw a scene over a cleared background. Sprites whose asset is
    /// not ready are skipped; the frame still renders.
    pub fn render(
        &mut self,
        scene: &Scene,
        sprites: &SpriteStore,
        text: Option<&mut TextPainter>,
    ) {
        self.canvas.fill(BACKGROUND);

        let mut paint = Paint::default();
        for rect in &scene.rects {
            let Some(r) = Rect::from_xywh(rect.x, rect.y, rect.w, rect.h) else {
                continue;
            };
            paint.set_color(Color::from_rgba8(
                rect.color[0],
                rect.color[1],
                rect.color[2],
                rect.color[3],
            ));
            self.canvas
                .fill_rect(r, &paint, Transform::identity(), None);
        }

        let blit = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        for sprite in &scene.sprites {
            let Some(pixmap) = sprites.get(sprite.asset) else {
                continue;
            };
            if sprite.w <= 0.0 || sprite.h <= 0.0 {
                continue;
            }
            let sx = sprite.w / pixmap.width() as f32;
            let sy = sprite.h / pixmap.height() as f32;
            let transform = Transform::from_translate(sprite.x, sprite.y).pre_scale(sx, sy);
            self.canvas
                .draw_pixmap(0, 0, pixmap.as_ref(), &blit, transform, None);
        }

        if let (Some(painter), Some(label)) = (text, scene.label.as_ref()) {
            let pm = painter.get_or_render(label);
            let x = (self.canvas.width() as f32 - pm.width() as f32) / 2.0;
            let y = self.canvas.height() as f32 * 0.08;
            self.canvas.draw_pixmap(
                x as i32,
                y as i32,
                pm.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
    }

    /// Copy the finished frame into the display buffer if sizes agree.
    pub fn present(&self, frame: &mut [u8]) {
        let data = self.canvas.data();
        if frame.len() == data.len() {
            frame.copy_from_slice(data);
        } else {
            log::debug!(
                "frame buffer size {} != canvas size {}, skipping present",
                frame.len(),
                data.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ludex_core::Scene;

    #[test]
    fn scene_with_missing_assets_still_renders() {
        let mut surface = SkiaSurface::new(64, 64).unwrap();
        let sprites = SpriteStore::new();
        let mut scene = Scene::default();
        scene.sprite(9, 10.0, 10.0, 16.0, 16.0); // never loaded
        scene.rect(0.0, 0.0, 8.0, 8.0, [255, 255, 255, 255]);
        surface.render(&scene, &sprites, None);
        // The rect landed, the sprite was skipped.
        let px = surface.canvas.pixel(2, 2).unwrap();
        assert_eq!(px.red(), 255);
        let empty = surface.canvas.pixel(12, 12).unwrap();
        assert_eq!(empty.red(), 0);
    }

    #[test]
    fn present_requires_matching_sizes() {
        let surface = SkiaSurface::new(8, 8).unwrap();
        let mut small = vec![0u8; 16];
        surface.present(&mut small); // skipped, no panic
        let mut exact = vec![0u8; 8 * 8 * 4];
        surface.present(&mut exact);
        assert_eq!(exact[3], 255); // opaque background
    }

    #[test]
    fn ready_sprite_is_scaled_into_place() {
        let mut surface = SkiaSurface::new(32, 32).unwrap();
        let mut store = SpriteStore::new();
        let mut pm = tiny_skia::Pixmap::new(2, 2).unwrap();
        pm.fill(Color::from_rgba8(0, 255, 0, 255));
        store.insert(0, pm);
        let mut scene = Scene::default();
        scene.sprite(0, 4.0, 4.0, 8.0, 8.0);
        surface.render(&scene, &store, None);
        let px = surface.canvas.pixel(8, 8).unwrap();
        assert!(px.green() > 200);
    }
}
