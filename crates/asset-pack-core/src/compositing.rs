use image::RgbaImage;
use tracing::debug;

use crate::error::{AssetPackError, Result};
use crate::model::{Rect, Sprite};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const CHANNELS: usize = 4;

/// Copy `src` into `canvas` with its top-left at (dx, dy), byte for byte.
///
/// Pixels are replaced, not blended, so alpha survives untouched. Rows or
/// columns falling outside the canvas are clipped.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    if dx >= cw || dy >= ch {
        return;
    }
    let copy_w = sw.min(cw - dx) as usize;
    let copy_h = sh.min(ch - dy);
    let src_stride = sw as usize * CHANNELS;
    let dst_stride = cw as usize * CHANNELS;
    let src_raw = src.as_raw();
    let dst_raw: &mut [u8] = canvas;
    for yy in 0..copy_h as usize {
        let s = yy * src_stride;
        let d = (dy as usize + yy) * dst_stride + dx as usize * CHANNELS;
        dst_raw[d..d + copy_w * CHANNELS].copy_from_slice(&src_raw[s..s + copy_w * CHANNELS]);
    }
}

/// Paint every placed sprite onto a fresh transparent `width` x `height` canvas.
///
/// Sprites must already carry an origin and fit inside the canvas. Their
/// frames are disjoint once packed, so the result does not depend on order;
/// with `parallel` (and the `parallel` feature) canvas rows are filled
/// concurrently.
pub fn compose(width: u32, height: u32, sprites: &[Sprite], parallel: bool) -> Result<RgbaImage> {
    let bounds = Rect::new(0, 0, width, height);
    let mut placed: Vec<(Rect, &Sprite)> = Vec::with_capacity(sprites.len());
    for s in sprites {
        let frame = s.frame().ok_or_else(|| {
            AssetPackError::InvalidInput(format!("sprite '{}' has not been placed", s.id))
        })?;
        if !bounds.contains(&frame) {
            return Err(AssetPackError::InvalidInput(format!(
                "sprite '{}' at {},{} ({}x{}) does not fit a {}x{} canvas",
                s.id, frame.x, frame.y, frame.w, frame.h, width, height
            )));
        }
        placed.push((frame, s));
    }

    let mut canvas = RgbaImage::new(width, height);
    if width == 0 || height == 0 {
        return Ok(canvas);
    }

    #[cfg(feature = "parallel")]
    {
        if parallel {
            compose_rows_parallel(&mut canvas, &placed);
            debug!(sprites = placed.len(), width, height, "composed (parallel)");
            return Ok(canvas);
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    for (frame, s) in &placed {
        blit_rgba(s.pixels(), &mut canvas, frame.x, frame.y);
    }
    debug!(sprites = placed.len(), width, height, "composed");
    Ok(canvas)
}

#[cfg(feature = "parallel")]
fn compose_rows_parallel(canvas: &mut RgbaImage, placed: &[(Rect, &Sprite)]) {
    let dst_stride = canvas.width() as usize * CHANNELS;
    let raw: &mut [u8] = canvas;
    raw.par_chunks_mut(dst_stride)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            for (frame, s) in placed {
                if y < frame.y || y >= frame.bottom() {
                    continue;
                }
                let src_stride = frame.w as usize * CHANNELS;
                let s_off = (y - frame.y) as usize * src_stride;
                let d_off = frame.x as usize * CHANNELS;
                row[d_off..d_off + src_stride]
                    .copy_from_slice(&s.pixels().as_raw()[s_off..s_off + src_stride]);
            }
        });
}
