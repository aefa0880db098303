use image::RgbaImage;
use tracing::{debug, instrument};

use crate::compositing::compose;
use crate::config::PackerConfig;
use crate::error::{AssetPackError, Result, UnplacedSprite};
use crate::manifest::{Manifest, build_manifest, check_names};
use crate::model::{PackStats, Rect, Sprite, collect_joins};
use crate::packer::{PackResult, Packable, pack, pack_sprites};

/// Output of a packing run: the composed canvas and its manifest.
pub struct AtlasOutput {
    pub width: u32,
    pub height: u32,
    pub canvas: RgbaImage,
    pub manifest: Manifest,
    pub stats: PackStats,
}

/// Packs `sprites` into one canvas and returns it with the manifest.
///
/// Notes:
/// - Names are checked before packing; pixels are only copied once the
///   manifest has been built, so any error leaves nothing half made.
/// - Empty input is not an error: the result is a 0x0 canvas and an empty manifest.
#[instrument(skip_all, fields(sprites = sprites.len()))]
pub fn build_atlas(mut sprites: Vec<Sprite>, cfg: &PackerConfig) -> Result<AtlasOutput> {
    cfg.validate()?;

    let joins = collect_joins(&sprites);
    check_names(&sprites, &joins)?;

    let (width, height) = pack_sprites(&mut sprites, cfg)?;
    debug!(width, height, margin = cfg.margin, "packed");

    let manifest = build_manifest(&sprites, &joins)?;
    let canvas = compose(width, height, &sprites, cfg.parallel)?;
    let stats = PackStats::from_sprites(&sprites, joins.len(), width, height);
    debug!(entries = manifest.len(), occupancy = stats.occupancy, "atlas built");

    Ok(AtlasOutput {
        width,
        height,
        canvas,
        manifest,
        stats,
    })
}

// ---------------- Layout-only API ----------------

struct LayoutItems {
    sizes: Vec<(u32, u32)>,
    margin: u32,
    slots: Vec<Option<(u32, u32)>>,
}

impl Packable for LayoutItems {
    fn count(&self) -> usize {
        self.sizes.len()
    }

    fn size_of(&self, index: usize) -> (u32, u32) {
        let (w, h) = self.sizes[index];
        let pad = self.margin.saturating_mul(2);
        (w.saturating_add(pad), h.saturating_add(pad))
    }

    fn place(&mut self, index: usize, x: u32, y: u32) {
        self.slots[index] = Some((x + self.margin, y + self.margin));
    }
}

/// Packs sizes without pixel data.
/// Inputs are (key, width, height); returns each key with its unpadded frame, in input order.
pub fn pack_layout<K: Into<String>>(
    inputs: Vec<(K, u32, u32)>,
    cfg: &PackerConfig,
) -> Result<(u32, u32, Vec<(String, Rect)>)> {
    cfg.validate()?;

    let mut keys = Vec::with_capacity(inputs.len());
    let mut sizes = Vec::with_capacity(inputs.len());
    for (k, w, h) in inputs {
        let key = k.into();
        if w == 0 || h == 0 {
            return Err(AssetPackError::InvalidInput(format!(
                "item '{}' has zero size ({}x{})",
                key, w, h
            )));
        }
        keys.push(key);
        sizes.push((w, h));
    }

    let mut items = LayoutItems {
        slots: vec![None; sizes.len()],
        sizes,
        margin: cfg.margin,
    };
    match pack(&mut items, cfg.max_dimension) {
        PackResult::Packed { width, height } => {
            let frames = keys
                .into_iter()
                .zip(items.sizes.iter().zip(items.slots.iter()))
                .map(|(key, (&(w, h), slot))| {
                    let (x, y) = slot.unwrap_or_default();
                    (key, Rect::new(x, y, w, h))
                })
                .collect();
            Ok((width, height, frames))
        }
        PackResult::Failed { unplaced } => Err(AssetPackError::PackingFailure {
            unplaced: unplaced
                .into_iter()
                .map(|i| UnplacedSprite {
                    id: keys[i].clone(),
                    width: items.sizes[i].0,
                    height: items.sizes[i].1,
                })
                .collect(),
        }),
    }
}
