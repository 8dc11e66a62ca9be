//! Redactor Core - crop and cover editing engine
//!
//! This crate provides the editing core behind Redactor: a pointer-driven
//! engine for choosing one crop rectangle and any number of opaque cover
//! (redaction) boxes over a raster image, with undo, detection-result
//! merging and PNG export.
//!
//! The core never performs I/O. Hosts pass in image bytes, pointer and
//! keyboard input and detection responses, and get geometry, events and
//! encoded exports back. [`Editor`] is the single entry point; the other
//! modules are usable on their own.

pub mod composite;
pub mod config;
pub mod cover;
pub mod crop;
pub mod decode;
pub mod detect;
pub mod drag;
pub mod editor;
pub mod encode;
pub mod geometry;
pub mod metrics;
pub mod source;
pub mod undo;
pub mod viewport;

pub use composite::{ExportError, ExportResult};
pub use config::{ConfigError, EditorConfig};
pub use cover::{Color, CoverBox, CoverCategory, CoverId, MergeStats};
pub use crop::CropPhase;
pub use detect::{DetectedBox, DetectionBatch, DetectionFamily, DetectionRequest};
pub use drag::{DragKind, Handle};
pub use editor::{
    Editor, EditorEvent, EditorGeometry, EditorKey, GestureTarget, MergeOutcome, PointerInput,
};
pub use geometry::{Point, Rect, Size};
pub use metrics::{ContainerBounds, Metrics};
pub use source::{ImageId, SourceImage};
