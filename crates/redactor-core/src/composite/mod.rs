//! Compositing the export image.
//!
//! Exports are computed at native resolution from the source pixels, the
//! applied crop and the visible covers. Zoom and pan never reach this
//! module, so the same inputs always produce the same bytes.
//!
//! # Pipeline
//!
//! 1. Round the crop to whole pixels and clamp it to the image
//! 2. Copy that sub-region 1:1 into a new buffer
//! 3. Paint each cover as an opaque rectangle, translated by the crop origin

mod export;
mod region;

pub use export::{composite, export, ExportError, ExportResult};
pub use region::{crop_pixels, PixelRegion};
