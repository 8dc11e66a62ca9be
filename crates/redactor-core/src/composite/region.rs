//! Whole-pixel regions.

use image::RgbaImage;

use crate::geometry::Rect;

/// A rectangle snapped to whole pixels inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRegion {
    /// Snap `rect` to pixels within a `width` x `height` image.
    ///
    /// Edges are rounded independently, coordinates are clamped to the
    /// image and the result is at least 1x1. Returns `None` for an empty
    /// image or a non-finite rectangle.
    pub fn snap(rect: &Rect, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 || !rect.is_finite() {
            return None;
        }
        let (x, w) = snap_span(rect.x, rect.right(), width);
        let (y, h) = snap_span(rect.y, rect.bottom(), height);
        Some(Self {
            x,
            y,
            width: w,
            height: h,
        })
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(
            self.x as f64,
            self.y as f64,
            self.width as f64,
            self.height as f64,
        )
    }
}

/// Snap `[start, end)` into `[0, extent)` with a length of at least one.
fn snap_span(start: f64, end: f64, extent: u32) -> (u32, u32) {
    let (start, end) = if end < start { (end, start) } else { (start, end) };
    let max = extent as f64;
    let lo = start.round().clamp(0.0, max - 1.0) as u32;
    let hi = (end.round().clamp(0.0, max) as u32).max(lo + 1);
    (lo, hi - lo)
}

/// Copy a region of `image` into a new buffer at 1:1 scale.
pub fn crop_pixels(image: &RgbaImage, region: PixelRegion) -> RgbaImage {
    image::imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image()
}
