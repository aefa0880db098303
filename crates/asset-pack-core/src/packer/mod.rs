use tracing::debug;

use crate::config::PackerConfig;
use crate::error::{AssetPackError, Result, UnplacedSprite};
use crate::model::Sprite;

pub mod guillotine;

use guillotine::GrowingGuillotine;

/// Anything the packer can lay out: a fixed number of rectangles with a size
/// each, and a way to record where each one ended up.
///
/// Sizes are the space to reserve (padding included); `place` receives the
/// top-left of that reserved slot.
pub trait Packable {
    fn count(&self) -> usize;
    fn size_of(&self, index: usize) -> (u32, u32);
    fn place(&mut self, index: usize, x: u32, y: u32);
}

/// Sprites seen through a uniform margin: each reserves `margin` extra pixels
/// on every side, and placements are recorded as the unpadded origin.
pub struct PaddedSprites<'a> {
    sprites: &'a mut [Sprite],
    margin: u32,
}

impl<'a> PaddedSprites<'a> {
    pub fn new(sprites: &'a mut [Sprite], margin: u32) -> Self {
        Self { sprites, margin }
    }
}

impl Packable for PaddedSprites<'_> {
    fn count(&self) -> usize {
        self.sprites.len()
    }

    fn size_of(&self, index: usize) -> (u32, u32) {
        let s = &self.sprites[index];
        let pad = self.margin.saturating_mul(2);
        (s.width().saturating_add(pad), s.height().saturating_add(pad))
    }

    fn place(&mut self, index: usize, x: u32, y: u32) {
        let s = &mut self.sprites[index];
        debug_assert!(s.origin.is_none(), "sprite '{}' placed twice", s.id);
        s.origin = Some((x + self.margin, y + self.margin));
    }
}

/// Outcome of a packing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackResult {
    /// Every item was placed; the canvas is the tight bounding box of all slots.
    Packed { width: u32, height: u32 },
    /// Indices of the items that were not placed, in attempt order. The first
    /// one is the item that could not fit.
    Failed { unplaced: Vec<usize> },
}

/// Packs every item of `items` into one bin no larger than `max_dimension` on
/// either edge.
///
/// Items are attempted largest first (by their longer side); equal sizes keep
/// input order, so identical inputs always produce identical layouts.
pub fn pack<P: Packable + ?Sized>(items: &mut P, max_dimension: u32) -> PackResult {
    let count = items.count();
    if count == 0 {
        return PackResult::Packed {
            width: 0,
            height: 0,
        };
    }

    let sizes: Vec<(u32, u32)> = (0..count).map(|i| items.size_of(i)).collect();
    let mut order: Vec<usize> = (0..count).collect();
    // stable: ties fall back to input order
    order.sort_by(|&a, &b| {
        let side_a = sizes[a].0.max(sizes[a].1);
        let side_b = sizes[b].0.max(sizes[b].1);
        side_b.cmp(&side_a)
    });

    let mut bin = GrowingGuillotine::new(max_dimension);
    for (n, &idx) in order.iter().enumerate() {
        let (w, h) = sizes[idx];
        match bin.insert(w, h) {
            Some(slot) => items.place(idx, slot.x, slot.y),
            None => {
                debug!(index = idx, w, h, max_dimension, "item does not fit");
                return PackResult::Failed {
                    unplaced: order[n..].to_vec(),
                };
            }
        }
    }

    let (width, height) = bin.used_bounds();
    debug!(
        count,
        width,
        height,
        free_rects = bin.free_list_len(),
        "packing finished"
    );
    PackResult::Packed { width, height }
}

/// Packs `sprites` with the configured margin and returns the canvas size.
/// On failure no sprite should be used: some may already carry an origin.
pub fn pack_sprites(sprites: &mut [Sprite], cfg: &PackerConfig) -> Result<(u32, u32)> {
    cfg.validate()?;
    let result = pack(&mut PaddedSprites::new(sprites, cfg.margin), cfg.max_dimension);
    match result {
        PackResult::Packed { width, height } => Ok((width, height)),
        PackResult::Failed { unplaced } => Err(AssetPackError::PackingFailure {
            unplaced: unplaced
                .into_iter()
                .map(|i| {
                    let s = &sprites[i];
                    UnplacedSprite {
                        id: s.id.clone(),
                        width: s.width(),
                        height: s.height(),
                    }
                })
                .collect(),
        }),
    }
}
