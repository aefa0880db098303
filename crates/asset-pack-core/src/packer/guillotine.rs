use tracing::trace;

use crate::model::Rect;

/// Direction in which the bin is enlarged when no free rectangle fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    Right,
    Down,
}

/// Guillotine bin that starts at the size of its first item and grows on demand.
///
/// Free rectangles are kept pairwise disjoint, so a placement only ever splits
/// the one free rectangle it lands in.
pub struct GrowingGuillotine {
    max_dimension: u32,
    width: u32,
    height: u32,
    free: Vec<Rect>,
    used: Vec<Rect>,
}

impl GrowingGuillotine {
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension,
            width: 0,
            height: 0,
            free: Vec::new(),
            used: Vec::new(),
        }
    }

    /// Current bin size (may be larger than `used_bounds`).
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Tight bounding box of everything placed so far.
    pub fn used_bounds(&self) -> (u32, u32) {
        self.used.iter().fold((0, 0), |(w, h), r| {
            (w.max(r.right()), h.max(r.bottom()))
        })
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }

    /// Places a `w` x `h` rectangle, growing the bin when nothing fits.
    /// Returns `None` when it cannot fit without an edge exceeding `max_dimension`.
    pub fn insert(&mut self, w: u32, h: u32) -> Option<Rect> {
        if w > self.max_dimension || h > self.max_dimension {
            return None;
        }
        if w == 0 || h == 0 {
            // occupies no area
            return Some(Rect::new(0, 0, w, h));
        }
        if self.width == 0 {
            self.width = w;
            self.height = h;
            self.free.push(Rect::new(0, 0, w, h));
        }

        if let Some((idx, slot)) = self.choose(w, h) {
            self.place(idx, &slot);
            return Some(slot);
        }

        let expansion = self.choose_growth(w, h)?;
        self.grow(&expansion);
        // every expansion leaves a free rectangle of at least w x h
        let (idx, slot) = self.choose(w, h)?;
        self.place(idx, &slot);
        Some(slot)
    }

    /// Best-area-fit: smallest leftover area, then smallest leftover short side.
    fn choose(&self, w: u32, h: u32) -> Option<(usize, Rect)> {
        let mut best: Option<(usize, (u64, u32))> = None;
        for (i, fr) in self.free.iter().enumerate() {
            if fr.w < w || fr.h < h {
                continue;
            }
            let area_fit = fr.area() - Rect::new(0, 0, w, h).area();
            let short_fit = (fr.w - w).min(fr.h - h);
            let score = (area_fit, short_fit);
            if best.is_none_or(|(_, s)| score < s) {
                best = Some((i, score));
            }
        }
        best.map(|(i, _)| (i, Rect::new(self.free[i].x, self.free[i].y, w, h)))
    }

    fn place(&mut self, idx: usize, placed: &Rect) {
        let fr = self.free.swap_remove(idx);
        let (a, b) = Self::split(&fr, placed);
        self.free.extend(a);
        self.free.extend(b);
        self.merge_free_list();
        self.used.push(*placed);
    }

    /// Splits the remainder of `fr` around `placed` (at the top-left of `fr`)
    /// with one cut along the shorter leftover axis, so the larger leftover
    /// keeps the full extent of `fr`.
    fn split(fr: &Rect, placed: &Rect) -> (Option<Rect>, Option<Rect>) {
        let w_right = fr.right() - placed.right();
        let h_bottom = fr.bottom() - placed.bottom();
        let split_horizontal = w_right <= h_bottom;

        let mut bottom = Rect::new(fr.x, placed.bottom(), 0, h_bottom);
        let mut right = Rect::new(placed.right(), fr.y, w_right, 0);
        if split_horizontal {
            bottom.w = fr.w;
            right.h = placed.h;
        } else {
            bottom.w = placed.w;
            right.h = fr.h;
        }
        let r1 = (bottom.w > 0 && bottom.h > 0).then_some(bottom);
        let r2 = (right.w > 0 && right.h > 0).then_some(right);
        (r1, r2)
    }

    /// Lists every way to enlarge the bin for a `w` x `h` item and keeps the
    /// one with the smallest resulting area, then the squarer bin, then the
    /// first listed (right stretches, right strip, bottom stretches, down strip).
    /// Candidates exceeding `max_dimension` are discarded.
    fn choose_growth(&self, w: u32, h: u32) -> Option<Expansion> {
        let (bw, bh) = (self.width, self.height);
        let mut candidates = Vec::new();

        // a free rectangle on the right edge, tall enough, only needs widening
        for (i, fr) in self.free.iter().enumerate() {
            if fr.right() == bw && fr.h >= h && fr.w < w {
                let width = bw as u64 + (w - fr.w) as u64;
                candidates.push(Expansion::stretch(Growth::Right, i, width, bh as u64));
            }
        }
        candidates.push(Expansion::strip(Growth::Right, bw as u64 + w as u64, bh.max(h) as u64));
        for (i, fr) in self.free.iter().enumerate() {
            if fr.bottom() == bh && fr.w >= w && fr.h < h {
                let height = bh as u64 + (h - fr.h) as u64;
                candidates.push(Expansion::stretch(Growth::Down, i, bw as u64, height));
            }
        }
        candidates.push(Expansion::strip(Growth::Down, bw.max(w) as u64, bh as u64 + h as u64));

        let max = self.max_dimension as u64;
        let mut best: Option<(Expansion, (u64, u64))> = None;
        for c in candidates {
            if c.width > max || c.height > max {
                continue;
            }
            let key = (c.width * c.height, c.width.max(c.height));
            if best.as_ref().is_none_or(|(_, k)| key < *k) {
                best = Some((c, key));
            }
        }
        let chosen = best.map(|(c, _)| c);
        trace!(?chosen, bin_w = bw, bin_h = bh, w, h, "grow bin");
        chosen
    }

    fn grow(&mut self, e: &Expansion) {
        let (bw, bh) = (self.width, self.height);
        // validated against max_dimension, so both fit in u32
        let (nw, nh) = (e.width as u32, e.height as u32);
        match (e.growth, e.stretch) {
            (Growth::Right, None) => {
                self.free.push(Rect::new(bw, 0, nw - bw, nh));
                if nh > bh {
                    self.free.push(Rect::new(0, bh, bw, nh - bh));
                }
            }
            (Growth::Down, None) => {
                self.free.push(Rect::new(0, bh, nw, nh - bh));
                if nw > bw {
                    self.free.push(Rect::new(bw, 0, nw - bw, bh));
                }
            }
            (Growth::Right, Some(idx)) => {
                // widen `fr` into the new column; the rest of the column stays free
                let fr = self.free.swap_remove(idx);
                let dw = nw - bw;
                self.free.push(Rect::new(fr.x, fr.y, fr.w + dw, fr.h));
                let above = Rect::new(bw, 0, dw, fr.y);
                let below = Rect::new(bw, fr.bottom(), dw, bh - fr.bottom());
                self.free.extend([above, below].into_iter().filter(|r| r.area() > 0));
            }
            (Growth::Down, Some(idx)) => {
                let fr = self.free.swap_remove(idx);
                let dh = nh - bh;
                self.free.push(Rect::new(fr.x, fr.y, fr.w, fr.h + dh));
                let left = Rect::new(0, bh, fr.x, dh);
                let right = Rect::new(fr.right(), bh, bw - fr.right(), dh);
                self.free.extend([left, right].into_iter().filter(|r| r.area() > 0));
            }
        }
        self.width = nw;
        self.height = nh;
        self.merge_free_list();
    }

    /// Replaces pairs of free rectangles sharing a whole edge by their union
    /// until no such pair is left. Free rectangles never overlap, so no
    /// rectangle can contain another and nothing needs pruning.
    fn merge_free_list(&mut self) {
        while let Some((i, j, union)) = self.find_mergeable() {
            self.free[i] = union;
            self.free.remove(j);
        }
    }

    fn find_mergeable(&self) -> Option<(usize, usize, Rect)> {
        self.free.iter().enumerate().find_map(|(i, a)| {
            self.free
                .iter()
                .enumerate()
                .skip(i + 1)
                .find_map(|(j, b)| edge_union(a, b).map(|u| (i, j, u)))
        })
    }
}

/// Union of two rectangles when it is itself a rectangle.
fn edge_union(a: &Rect, b: &Rect) -> Option<Rect> {
    let side_by_side = a.y == b.y && a.h == b.h && (a.right() == b.x || b.right() == a.x);
    let stacked = a.x == b.x && a.w == b.w && (a.bottom() == b.y || b.bottom() == a.y);
    if side_by_side {
        Some(Rect::new(a.x.min(b.x), a.y, a.w + b.w, a.h))
    } else if stacked {
        Some(Rect::new(a.x, a.y.min(b.y), a.w, a.h + b.h))
    } else {
        None
    }
}

/// One way of enlarging the bin: a new full strip along an edge, or a free
/// rectangle already touching that edge stretched just far enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Expansion {
    growth: Growth,
    stretch: Option<usize>,
    width: u64,
    height: u64,
}

impl Expansion {
    fn strip(growth: Growth, width: u64, height: u64) -> Self {
        Self {
            growth,
            stretch: None,
            width,
            height,
        }
    }

    fn stretch(growth: Growth, free: usize, width: u64, height: u64) -> Self {
        Self {
            growth,
            stretch: Some(free),
            width,
            height,
        }
    }
}
