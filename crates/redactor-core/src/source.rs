//! Source image identity and pixels.

use std::fmt;
use std::path::Path;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::decode::{decode_image, DecodeError};
use crate::geometry::Size;

/// Host-assigned identity of a source image.
///
/// All per-image editor state is keyed by this value; two loads with the
/// same id share state, a different id starts from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A decoded source image ready for editing.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub id: ImageId,
    /// Original file name, used to suggest export names
    pub file_name: Option<String>,
    /// Native pixels, orientation already applied
    pub pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(id: ImageId, file_name: Option<String>, pixels: RgbaImage) -> Self {
        Self {
            id,
            file_name,
            pixels,
        }
    }

    /// Decode encoded bytes (JPEG or PNG) into a source image.
    pub fn decode(
        id: ImageId,
        file_name: Option<String>,
        bytes: &[u8],
    ) -> Result<Self, DecodeError> {
        Ok(Self::new(id, file_name, decode_image(bytes)?))
    }

    pub fn size(&self) -> Size {
        let (width, height) = self.pixels.dimensions();
        Size::new(width, height)
    }

    /// Suggested export name: `<stem><suffix>.png`, `image<suffix>.png`
    /// when the source has no usable name.
    pub fn export_file_name(&self, suffix: &str) -> String {
        let stem = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).file_stem())
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or("image");
        format!("{stem}{suffix}.png")
    }
}
