//! Shared types for WASM bindings.
//!
//! This module provides JavaScript-compatible wrappers for core types,
//! plus the string parsers used to turn host arguments into core values.

use redactor_core::{
    CoverId, CropPhase, DetectionFamily, DragKind, ExportResult, GestureTarget, Handle,
};
use wasm_bindgen::prelude::*;

/// An encoded PNG export for JavaScript.
///
/// Used both for the final cropped, covered export and for the image sent
/// to detection.
#[wasm_bindgen]
pub struct JsExportResult {
    bytes: Vec<u8>,
    file_name: String,
    width: u32,
    height: u32,
}

#[wasm_bindgen]
impl JsExportResult {
    /// Get the encoded PNG bytes as a Uint8Array.
    ///
    /// Note: This copies the data to JavaScript.
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Suggested download file name
    #[wasm_bindgen(getter)]
    pub fn file_name(&self) -> String {
        self.file_name.clone()
    }

    /// Image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        "image/png".to_string()
    }

    /// Get the byte length of the encoded data
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }
}

impl From<ExportResult> for JsExportResult {
    fn from(result: ExportResult) -> Self {
        Self {
            bytes: result.bytes,
            file_name: result.file_name,
            width: result.width,
            height: result.height,
        }
    }
}

/// Parse a drag kind: `"move"` or one of the handle names `n`, `ne`, ...
pub(crate) fn parse_drag_kind(kind: &str) -> Result<DragKind, String> {
    if kind.eq_ignore_ascii_case("move") {
        return Ok(DragKind::Move);
    }
    kind.parse::<Handle>().map(DragKind::Resize)
}

/// Parse a gesture target: `"crop"`, or `"cover"` with the cover id.
pub(crate) fn parse_target(target: &str, cover_id: Option<u32>) -> Result<GestureTarget, String> {
    match (target, cover_id) {
        ("crop", _) => Ok(GestureTarget::Crop),
        ("cover", Some(id)) => Ok(GestureTarget::Cover(CoverId(id))),
        ("cover", None) => Err("Cover target requires an id".to_string()),
        (other, _) => Err(format!("Unknown gesture target: {other}")),
    }
}

pub(crate) fn parse_family(family: &str) -> Result<DetectionFamily, String> {
    family.parse()
}

pub(crate) fn phase_name(phase: CropPhase) -> &'static str {
    match phase {
        CropPhase::Idle => "idle",
        CropPhase::Selecting => "selecting",
    }
}
