use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{AssetPackError, Result};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the interiors of `self` and `r` overlap.
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.x >= r.right() || r.x >= self.right() || self.y >= r.bottom() || r.y >= self.bottom())
    }
}

/// Stretchable border insets used for non-uniform scaling.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NinePatch {
    pub top: u32,
    pub left: u32,
    pub right: u32,
    pub bottom: u32,
    #[serde(default)]
    pub border: bool,
}

impl NinePatch {
    /// Checks the insets against the size of the region they decorate.
    pub fn validate(&self, id: &str, width: u32, height: u32) -> Result<()> {
        let vertical = self.top as u64 + self.bottom as u64;
        let horizontal = self.left as u64 + self.right as u64;
        if vertical > height as u64 || horizontal > width as u64 {
            return Err(AssetPackError::InvalidNinePatch {
                id: id.to_string(),
                top: self.top,
                left: self.left,
                right: self.right,
                bottom: self.bottom,
                width,
                height,
            });
        }
        Ok(())
    }
}

/// A named sub-region of a sprite, declared relative to the sprite's top-left corner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Join {
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ninepatch: Option<NinePatch>,
}

impl Join {
    pub fn new(id: impl Into<String>, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            w,
            h,
            ninepatch: None,
        }
    }

    pub fn with_ninepatch(mut self, ninepatch: NinePatch) -> Self {
        self.ninepatch = Some(ninepatch);
        self
    }

    /// Checks that the join lies inside a `parent_w` x `parent_h` parent and
    /// that its own nine-patch fits it.
    pub fn validate(&self, parent: &str, parent_w: u32, parent_h: u32) -> Result<()> {
        let fits_x = self.x as u64 + self.w as u64 <= parent_w as u64;
        let fits_y = self.y as u64 + self.h as u64 <= parent_h as u64;
        if !fits_x || !fits_y {
            return Err(AssetPackError::JoinOutOfBounds {
                join: self.id.clone(),
                parent: parent.to_string(),
                x: self.x,
                y: self.y,
                w: self.w,
                h: self.h,
                parent_w,
                parent_h,
            });
        }
        if let Some(np) = &self.ninepatch {
            np.validate(&self.id, self.w, self.h)?;
        }
        Ok(())
    }
}

/// A join addressed by the id of the sprite it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRef {
    pub parent: String,
    pub join: Join,
}

impl JoinRef {
    pub fn new(parent: impl Into<String>, join: Join) -> Self {
        Self {
            parent: parent.into(),
            join,
        }
    }
}

/// One input image: a named rectangle with its pixels, optional nine-patch
/// insets and nested joins. `origin` is the unpadded top-left corner inside
/// the atlas and is set once by the packer.
///
/// The pixel buffer is fixed at construction; the sprite's size is always
/// the buffer's size.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub id: String,
    pub origin: Option<(u32, u32)>,
    pub ninepatch: Option<NinePatch>,
    pub joins: Vec<Join>,
    pixels: RgbaImage,
}

impl Sprite {
    /// Creates a sprite sized after its pixel buffer. Zero-sized buffers are rejected.
    pub fn new(id: impl Into<String>, pixels: RgbaImage) -> Result<Self> {
        let id = id.into();
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetPackError::InvalidInput(format!(
                "sprite '{}' has an empty pixel buffer ({}x{})",
                id, width, height
            )));
        }
        Ok(Self {
            id,
            origin: None,
            ninepatch: None,
            joins: Vec::new(),
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn with_ninepatch(mut self, ninepatch: NinePatch) -> Result<Self> {
        ninepatch.validate(&self.id, self.width(), self.height())?;
        self.ninepatch = Some(ninepatch);
        Ok(self)
    }

    pub fn with_join(mut self, join: Join) -> Result<Self> {
        join.validate(&self.id, self.width(), self.height())?;
        self.joins.push(join);
        Ok(self)
    }

    /// Placed (unpadded) frame of this sprite, once the packer has run.
    pub fn frame(&self) -> Option<Rect> {
        self.origin
            .map(|(x, y)| Rect::new(x, y, self.width(), self.height()))
    }

    /// Nested joins addressed by this sprite's id.
    pub fn join_refs(&self) -> impl Iterator<Item = JoinRef> + '_ {
        self.joins
            .iter()
            .map(|j| JoinRef::new(self.id.clone(), j.clone()))
    }
}

/// Flattens the joins nested in `sprites` for the manifest builder.
pub fn collect_joins(sprites: &[Sprite]) -> Vec<JoinRef> {
    sprites.iter().flat_map(Sprite::join_refs).collect()
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PackStats {
    /// Number of sprites placed.
    pub num_sprites: usize,
    /// Number of joins resolved into the manifest.
    pub num_joins: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// `canvas_width * canvas_height`.
    pub canvas_area: u64,
    /// Sum of the unpadded sprite areas.
    pub used_area: u64,
    /// used_area / canvas_area (0.0 to 1.0). Margins count as waste.
    pub occupancy: f64,
}

impl PackStats {
    pub fn from_sprites(sprites: &[Sprite], num_joins: usize, width: u32, height: u32) -> Self {
        let canvas_area = width as u64 * height as u64;
        let used_area: u64 = sprites
            .iter()
            .map(|s| s.width() as u64 * s.height() as u64)
            .sum();
        let occupancy = if canvas_area > 0 {
            used_area as f64 / canvas_area as f64
        } else {
            0.0
        };
        Self {
            num_sprites: sprites.len(),
            num_joins,
            canvas_width: width,
            canvas_height: height,
            canvas_area,
            used_area,
            occupancy,
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Canvas: {}x{}, Sprites: {}, Joins: {}, Occupancy: {:.2}%, Used Area: {} px²",
            self.canvas_width,
            self.canvas_height,
            self.num_sprites,
            self.num_joins,
            self.occupancy * 100.0,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.canvas_area.saturating_sub(self.used_area)
    }
}
