//! Core library for packing images into a single atlas page.
//!
//! - Packer: growing guillotine bin (best-area-fit, shorter-leftover-axis split), largest side first
//! - Composer: byte-exact blit of every sprite onto a transparent canvas, optionally row-parallel
//! - Manifest: `name -> {x, y, w, h, ninepatch?}` for sprites and the joins nested in them
//! - Pipeline: `build_atlas` chains the three and fails before producing anything partial
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use asset_pack_core::{Join, PackerConfig, Sprite, build_atlas};
//! # fn main() -> anyhow::Result<()> {
//! let button = ImageReader::open("button.png")?.decode()?.to_rgba8();
//! let icon = ImageReader::open("icon.png")?.decode()?.to_rgba8();
//! let sprites = vec![
//!   Sprite::new("button", button)?.with_join(Join::new("button_label", 4, 4, 24, 8))?,
//!   Sprite::new("icon", icon)?,
//! ];
//! let cfg = PackerConfig { margin: 4, max_dimension: 2048, ..Default::default() };
//! let out = build_atlas(sprites, &cfg)?;
//! println!("{}x{}, {} entries", out.width, out.height, out.manifest.len());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod manifest;
pub mod model;
pub mod packer;
pub mod pipeline;

pub use config::*;
pub use error::*;
pub use manifest::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `asset_pack_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::compositing::compose;
    pub use crate::config::{PackerConfig, PackerConfigBuilder};
    pub use crate::error::{AssetPackError, UnplacedSprite};
    pub use crate::manifest::{Manifest, ManifestEntry, build_manifest};
    pub use crate::model::{Join, JoinRef, NinePatch, PackStats, Rect, Sprite, collect_joins};
    pub use crate::packer::{PackResult, Packable, PaddedSprites, pack, pack_sprites};
    pub use crate::{AtlasOutput, build_atlas, pack_layout};
}
