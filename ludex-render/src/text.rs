use std::collections::HashMap;
use std::path::Path;

use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use anyhow::{Context, Result};
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};

/// Rasterizes prompt strings into cached pixmaps.
///
/// The handful of labels the games show repeat across frames, so each
/// string is laid out once and blitted afterwards.
pub struct TextPainter {
    font: FontVec,
    size_px: f32,
    cache: HashMap<String, Pixmap>,
    /// Invisible 1x1 stand-in for strings that rasterize to nothing.
    blank: Pixmap,
}

impl TextPainter {
    pub fn from_file(path: &Path, size_px: f32) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading font file {}", path.display()))?;
        let font = FontVec::try_from_vec(bytes).context("parsing font file")?;
        let blank = Pixmap::new(1, 1).context("allocating fallback pixmap")?;
        Ok(Self {
            font,
            size_px,
            cache: HashMap::new(),
            blank,
        })
    }

    pub fn get_or_render(&mut self, text: &str) -> &Pixmap {
        if !self.cache.contains_key(text) {
            match render_text_pixmap(
                text,
                self.size_px,
                &self.font,
                Color::from_rgba8(255, 255, 255, 255),
            ) {
                Some(pm) => {
                    self.cache.insert(text.to_owned(), pm);
                }
                None => return &self.blank,
            }
        }
        &self.cache[text]
    }
}

/// Lay out and rasterize one line of text into a fresh pixmap. `None`
/// when no glyph produces pixels or the bounds don't fit a pixmap.
fn render_text_pixmap(text: &str, font_size: f32, font: &impl Font, color: Color) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // Layout with the baseline at the ascent.
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    // Union pixel bounds from the outlined glyphs.
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for g in &glyphs {
        if let Some(out) = font.outline_glyph(g.clone()) {
            let b = out.px_bounds();
            min_x = min_x.min(b.min.x);
            min_y = min_y.min(b.min.y);
            max_x = max_x.max(b.max.x);
            max_y = max_y.max(b.max.y);
        }
    }
    if min_x == f32::INFINITY {
        return None;
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;

    let stride = pm.width() as usize;
    let dst = pm.pixels_mut();
    let cu = [
        (color.red() * 255.0) as u8,
        (color.green() * 255.0) as u8,
        (color.blue() * 255.0) as u8,
        (color.alpha() * 255.0) as u8,
    ];

    for g in &glyphs {
        if let Some(out) = font.outline_glyph(g.clone()) {
            let b = out.px_bounds();
            out.draw(|x, y, cov| {
                if cov <= f32::EPSILON {
                    return;
                }
                let ix = (x as f32 + b.min.x - min_x).floor() as i32;
                let iy = (y as f32 + b.min.y - min_y).floor() as i32;
                if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                    return;
                }
                let i = iy as usize * stride + ix as usize;
                if i >= dst.len() {
                    return;
                }

                // Premultiply the source by coverage * alpha, then
                // Porter-Duff over in premultiplied space.
                let a_lin = (cov * cu[3] as f32 / 255.0).clamp(0.0, 1.0);
                let sr = (cu[0] as f32 * a_lin) as u8;
                let sg = (cu[1] as f32 * a_lin) as u8;
                let sb = (cu[2] as f32 * a_lin) as u8;
                let sa = (a_lin * 255.0) as u8;

                let Some(src) = PremultipliedColorU8::from_rgba(sr, sg, sb, sa) else {
                    return;
                };
                let bg = dst[i];
                let inv = 1.0 - (sa as f32 / 255.0);
                let r = src.red().saturating_add((bg.red() as f32 * inv) as u8);
                let g = src.green().saturating_add((bg.green() as f32 * inv) as u8);
                let b = src.blue().saturating_add((bg.blue() as f32 * inv) as u8);
                let a = src.alpha().saturating_add((bg.alpha() as f32 * inv) as u8);
                if let Some(px) = PremultipliedColorU8::from_rgba(r, g, b, a) {
                    dst[i] = px;
                }
            });
        }
    }

    Some(pm)
}
