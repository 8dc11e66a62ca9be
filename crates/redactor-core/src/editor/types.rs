//! Values exchanged with the host.

use serde::{Deserialize, Serialize};

use crate::cover::{Color, CoverBox, CoverCategory, CoverId, MergeStats};
use crate::crop::CropPhase;
use crate::geometry::{Point, Rect, Size};
use crate::source::ImageId;

/// What a pointer gesture edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum GestureTarget {
    /// The draft crop rectangle; only while a crop selection is active
    Crop,
    Cover(CoverId),
}

/// A pointer event as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerInput {
    pub client_x: f64,
    pub client_y: f64,
    /// Aspect-lock modifier (shift) held
    #[serde(default)]
    pub keep_aspect: bool,
}

impl PointerInput {
    pub fn new(client_x: f64, client_y: f64) -> Self {
        Self {
            client_x,
            client_y,
            keep_aspect: false,
        }
    }

    pub fn with_aspect_lock(mut self, keep_aspect: bool) -> Self {
        self.keep_aspect = keep_aspect;
        self
    }

    pub fn client(&self) -> Point {
        Point::new(self.client_x, self.client_y)
    }
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorKey {
    /// Commit the crop selection
    Enter,
    /// Cancel the active gesture, then the crop selection
    Escape,
    /// Ctrl/Cmd+Z
    Undo,
}

impl EditorKey {
    /// Map a DOM `KeyboardEvent.key` value plus the undo modifier.
    pub fn from_dom(key: &str, ctrl_or_meta: bool) -> Option<Self> {
        match key {
            "Enter" => Some(EditorKey::Enter),
            "Escape" | "Esc" => Some(EditorKey::Escape),
            "z" | "Z" if ctrl_or_meta => Some(EditorKey::Undo),
            _ => None,
        }
    }
}

/// Notifications queued for the host UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EditorEvent {
    CropPhaseChanged { phase: CropPhase },
    /// The applied crop was committed or restored
    CropCommitted { applied: Option<Rect> },
    CoversChanged,
    SourceChanged { image_id: Option<ImageId> },
}

/// Result of handing a detection batch to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged(MergeStats),
    /// The batch belongs to an image that is no longer loaded
    Stale,
    NoSource,
    /// The batch anchor is not a finite point
    InvalidAnchor,
}

/// A cover box as the host renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverView {
    #[serde(flatten)]
    pub cover: CoverBox,
    /// Rectangle in absolute image pixels
    pub absolute: Rect,
    /// Rectangle in container pixels, when the layout is known
    pub display: Option<Rect>,
    pub visible: bool,
    pub paint_color: Color,
}

/// Serializable snapshot of everything the host draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorGeometry {
    pub image_id: Option<ImageId>,
    pub natural: Option<Size>,
    pub phase: CropPhase,
    pub draft_rect: Option<Rect>,
    pub draft_display: Option<Rect>,
    pub applied_rect: Option<Rect>,
    pub cover_origin: Point,
    pub covers: Vec<CoverView>,
    pub available_filters: Vec<CoverCategory>,
    pub active_filters: Vec<CoverCategory>,
    pub covers_enabled: bool,
    pub cover_color: Color,
    pub can_undo: bool,
}
