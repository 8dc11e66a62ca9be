//! Redactor WASM - WebAssembly bindings for Redactor
//!
//! This crate exposes the redactor-core editing engine to JavaScript and
//! TypeScript hosts.
//!
//! # Module Structure
//!
//! - `editor` - The interactive crop and cover editor
//! - `types` - WASM-compatible wrappers for export results
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsEditor } from '@redactor/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const editor = new JsEditor(undefined);
//! editor.load_image(file.name, file.name, new Uint8Array(await file.arrayBuffer()));
//!
//! // Run text detection against the current crop
//! const anchor = editor.detection_anchor();
//! const image = editor.detection_image();
//! const response = await upload(editor.detection_endpoint("text"), image.bytes());
//! editor.merge_detected_boxes(imageId, "text", anchor.x, anchor.y, response);
//! ```

use wasm_bindgen::prelude::*;

mod editor;
mod types;

// Re-export public types
pub use editor::JsEditor;
pub use types::JsExportResult;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // Logging goes through `tracing`; the host installs a subscriber if it
    // wants the output.
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Filter labels of every cover category, in display order.
#[wasm_bindgen]
pub fn category_labels() -> Vec<String> {
    redactor_core::CoverCategory::ALL
        .into_iter()
        .map(|c| c.label().to_string())
        .collect()
}
