use std::path::Path;

use ludex_core::{AssetId, MediaState};
use tiny_skia::{IntSize, Pixmap};

/// Preloaded image assets keyed by slot id.
///
/// Loading is best-effort: a slot that failed to decode stays `Failed`
/// and its draws are skipped, so a broken asset degrades the visuals of
/// one entity instead of aborting the trial.
#[derive(Default)]
pub struct SpriteStore {
    slots: Vec<Slot>,
}

struct Slot {
    state: MediaState,
    pixmap: Option<Pixmap>,
}

impl SpriteStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, id: AssetId) -> &mut Slot {
        if self.slots.len() <= id {
            self.slots.resize_with(id + 1, || Slot {
                state: MediaState::Pending,
                pixmap: None,
            });
        }
        &mut self.slots[id]
    }

    /// Decode a PNG/JPEG file into a slot.
    pub fn load_file(&mut self, id: AssetId, path: &Path) {
        let loaded = image::open(path).map(|img| img.into_rgba8());
        let slot = self.slot_mut(id);
        match loaded {
            Ok(rgba) => {
                let (w, h) = rgba.dimensions();
                let size = IntSize::from_wh(w, h);
                match size.and_then(|size| Pixmap::from_vec(premultiply(rgba.into_raw()), size)) {
                    Some(pixmap) => {
                        slot.pixmap = Some(pixmap);
                        slot.state = MediaState::Ready;
                    }
                    None => {
                        slot.state = MediaState::Failed;
                        log::warn!("asset {id}: decoded image has invalid dimensions");
                    }
                }
            }
            Err(e) => {
                slot.state = MediaState::Failed;
                log::warn!("asset {id}: failed to load {}: {e}", path.display());
            }
        }
    }

    /// Install an already-decoded pixmap (tests, generated art).
    pub fn insert(&mut self, id: AssetId, pixmap: Pixmap) {
        let slot = self.slot_mut(id);
        slot.pixmap = Some(pixmap);
        slot.state = MediaState::Ready;
    }

    pub fn state(&self, id: AssetId) -> MediaState {
        self.slots
            .get(id)
            .map_or(MediaState::Pending, |slot| slot.state)
    }

    /// The slot's pixmap, only while ready.
    pub fn get(&self, id: AssetId) -> Option<&Pixmap> {
        self.slots.get(id).and_then(|slot| {
            if slot.state == MediaState::Ready {
                slot.pixmap.as_ref()
            } else {
                None
            }
        })
    }
}

/// Straight-alpha RGBA bytes to tiny-skia's premultiplied form.
fn premultiply(mut data: Vec<u8>) -> Vec<u8> {
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        px[0] = ((u16::from(px[0]) * a) / 255) as u8;
        px[1] = ((u16::from(px[1]) * a) / 255) as u8;
        px[2] = ((u16::from(px[2]) * a) / 255) as u8;
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_marks_slot_failed() {
        let mut store = SpriteStore::new();
        store.load_file(2, Path::new("/nonexistent/sprite.png"));
        assert_eq!(store.state(2), MediaState::Failed);
        assert!(store.get(2).is_none());
    }

    #[test]
    fn unloaded_slot_is_pending() {
        let store = SpriteStore::new();
        assert_eq!(store.state(7), MediaState::Pending);
        assert!(store.get(7).is_none());
    }

    #[test]
    fn inserted_pixmap_is_ready() {
        let mut store = SpriteStore::new();
        store.insert(0, Pixmap::new(4, 4).unwrap());
        assert_eq!(store.state(0), MediaState::Ready);
        assert!(store.get(0).is_some());
    }

    #[test]
    fn premultiply_scales_by_alpha() {
        let out = premultiply(vec![200, 100, 50, 128]);
        assert_eq!(out[3], 128);
        assert!(out[0] <= 101 && out[0] >= 99);
    }
}
