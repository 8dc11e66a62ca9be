//! Cropped, covered export images.

use image::RgbaImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::cover::Color;
use crate::encode::{encode_png, EncodeError};
use crate::geometry::Rect;
use crate::source::SourceImage;

use super::region::{crop_pixels, PixelRegion};

/// Errors that can occur while producing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The source has no pixels to export.
    #[error("Source image is empty")]
    EmptySource,

    /// PNG encoding failed
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// An encoded export ready for the host to save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// PNG bytes
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

impl ExportResult {
    pub fn mime_type(&self) -> &'static str {
        "image/png"
    }
}

/// Crop `source` and paint `covers` on top.
///
/// `covers` are absolute image rectangles with their paint color. Covers
/// entirely outside the crop are skipped. Returns `None` for an empty
/// source or a non-finite crop.
pub fn composite(source: &RgbaImage, crop: &Rect, covers: &[(Rect, Color)]) -> Option<RgbaImage> {
    let (width, height) = source.dimensions();
    let region = PixelRegion::snap(crop, width, height)?;
    let mut output = crop_pixels(source, region);

    let origin_x = region.x as f64;
    let origin_y = region.y as f64;
    let mut painted = 0usize;
    for (rect, color) in covers {
        let local = rect.translate(-origin_x, -origin_y);
        if paint_rect(&mut output, &local, *color) {
            painted += 1;
        }
    }

    debug!(
        width = region.width,
        height = region.height,
        covers = covers.len(),
        painted,
        "composited export"
    );
    Some(output)
}

/// Composite and encode the export for `source`.
///
/// `crop` of `None` exports the full image.
pub fn export(
    source: &SourceImage,
    crop: Option<Rect>,
    covers: &[(Rect, Color)],
    suffix: &str,
) -> Result<ExportResult, ExportError> {
    let crop = crop.unwrap_or_else(|| source.size().to_rect());
    let pixels = composite(&source.pixels, &crop, covers).ok_or(ExportError::EmptySource)?;
    let (width, height) = pixels.dimensions();
    let bytes = encode_png(&pixels)?;
    let file_name = source.export_file_name(suffix);

    info!(
        image = %source.id,
        width,
        height,
        bytes = bytes.len(),
        %file_name,
        "export encoded"
    );
    Ok(ExportResult {
        bytes,
        file_name,
        width,
        height,
    })
}

/// Fill `rect` (output coordinates) with an opaque color.
///
/// Returns false when the rectangle misses the image entirely.
fn paint_rect(image: &mut RgbaImage, rect: &Rect, color: Color) -> bool {
    let (width, height) = image.dimensions();
    let bounds = Rect::new(0.0, 0.0, width as f64, height as f64);
    if !rect.is_finite() || !rect.intersects(&bounds) {
        return false;
    }
    let Some(region) = PixelRegion::snap(rect, width, height) else {
        return false;
    };

    let pixel = color.to_rgba();
    for y in region.y..region.bottom() {
        for x in region.x..region.right() {
            image.put_pixel(x, y, pixel);
        }
    }
    true
}
