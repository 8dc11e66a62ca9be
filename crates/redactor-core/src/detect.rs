//! Detection requests and responses.
//!
//! The editor never talks to a detection backend itself. It builds a
//! [`DetectionRequest`] for the host to send, and the host hands the raw
//! response back as a [`DetectionBatch`] for merging.
//!
//! # Response Envelope
//!
//! ```json
//! { "ok": true, "boxes": [{ "x": 10, "y": 4, "width": 80, "height": 12, "category": "date" }] }
//! { "ok": false, "error": "ocr-failed", "message": "..." }
//! ```
//!
//! A failed or malformed response becomes an empty box list. Merging an
//! empty list still clears the family's previous boxes, so stale results
//! from before a re-detection are never kept.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cover::CoverCategory;
use crate::geometry::{Point, Rect};
use crate::source::ImageId;

/// Why a detection response could not be used.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The backend reported a failure.
    #[error("Detection failed: {error}{}", .message.as_deref().map(|m| format!(" ({m})")).unwrap_or_default())]
    Backend {
        error: String,
        message: Option<String>,
    },

    /// The response does not have the expected shape.
    #[error("Malformed detection response: {0}")]
    Malformed(String),
}

/// A family of detection calls and the categories it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionFamily {
    /// OCR-based detection of dates, IBANs, phone numbers and emails
    Text,
    /// Face detection
    Faces,
}

impl DetectionFamily {
    /// Categories a response of this family replaces on merge.
    pub fn authoritative_categories(self) -> &'static [CoverCategory] {
        match self {
            DetectionFamily::Text => &[
                CoverCategory::Date,
                CoverCategory::Iban,
                CoverCategory::PhoneNumbers,
                CoverCategory::Emails,
            ],
            DetectionFamily::Faces => &[CoverCategory::Faces],
        }
    }

    /// Backend path the host posts the request image to.
    pub fn endpoint(self) -> &'static str {
        match self {
            DetectionFamily::Text => "/api/ocr/boxes",
            DetectionFamily::Faces => "/api/faces",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DetectionFamily::Text => "text",
            DetectionFamily::Faces => "faces",
        }
    }
}

impl fmt::Display for DetectionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "ocr" => Ok(DetectionFamily::Text),
            "faces" | "face" => Ok(DetectionFamily::Faces),
            _ => Err(format!("Unknown detection family: {s}")),
        }
    }
}

/// Tuning sent along with face detection requests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceDetectionParams {
    /// Image pyramid step of the cascade detector
    pub scale_factor: f64,
    /// Neighbor detections required to keep a candidate
    pub min_neighbors: u32,
}

impl Default for FaceDetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
        }
    }
}

/// A rectangle reported by a detection backend, relative to the
/// submitted image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedBox {
    #[serde(flatten)]
    pub rect: Rect,
    pub category: Option<CoverCategory>,
    /// Recognized text, for text detections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl DetectedBox {
    pub fn new(rect: Rect, category: Option<CoverCategory>) -> Self {
        Self {
            rect,
            category,
            text: None,
            confidence: None,
        }
    }

    /// The category this box gets when merged, always one of
    /// `authoritative`.
    ///
    /// A box outside the family (or uncategorized) takes the family's
    /// category when it has exactly one; otherwise it has none and is
    /// dropped, since the next run of the family could never replace it.
    pub fn resolved_category(&self, authoritative: &[CoverCategory]) -> Option<CoverCategory> {
        match (self.category, authoritative) {
            (Some(category), _) if authoritative.contains(&category) => Some(category),
            (_, [only]) => Some(*only),
            _ => None,
        }
    }
}

/// Everything the host needs to issue a detection call.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub image_id: ImageId,
    pub family: DetectionFamily,
    /// Cover origin the response must be merged against
    pub anchor: Point,
    /// PNG of the crop-applied image, without covers
    pub image_png: Vec<u8>,
    pub file_name: String,
    pub face_params: FaceDetectionParams,
}

impl DetectionRequest {
    /// Extra multipart form fields beside the `image` upload.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        match self.family {
            DetectionFamily::Text => Vec::new(),
            DetectionFamily::Faces => vec![
                ("scale_factor", self.face_params.scale_factor.to_string()),
                ("min_neighbors", self.face_params.min_neighbors.to_string()),
            ],
        }
    }
}

/// A detection result tagged with the image and anchor it was requested for.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionBatch {
    pub image_id: ImageId,
    pub anchor: Point,
    pub family: DetectionFamily,
    pub boxes: Vec<DetectedBox>,
}

impl DetectionBatch {
    /// Build a batch from a raw backend response.
    ///
    /// A failed or malformed response yields an empty batch, which still
    /// replaces the family's existing boxes when merged.
    pub fn from_response(
        image_id: ImageId,
        anchor: Point,
        family: DetectionFamily,
        response: &Value,
    ) -> Self {
        let boxes = parse_detection_response(response).unwrap_or_else(|e| {
            warn!(%family, error = %e, "detection failed, treating as empty");
            Vec::new()
        });
        Self {
            image_id,
            anchor,
            family,
            boxes,
        }
    }

    /// A batch for a call that never produced a response (network error).
    pub fn failed(image_id: ImageId, anchor: Point, family: DetectionFamily) -> Self {
        Self {
            image_id,
            anchor,
            family,
            boxes: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    ok: Option<bool>,
    #[serde(default)]
    boxes: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Parse a detection response envelope.
///
/// Individual malformed entries (missing or non-numeric coordinates,
/// non-finite values, non-positive size) are dropped; only an unusable
/// envelope is an error.
pub fn parse_detection_response(response: &Value) -> Result<Vec<DetectedBox>, DetectionError> {
    let envelope = Envelope::deserialize(response)
        .map_err(|e| DetectionError::Malformed(e.to_string()))?;

    if envelope.ok == Some(false) {
        return Err(DetectionError::Backend {
            error: envelope.error.unwrap_or_else(|| "unknown-error".to_string()),
            message: envelope.message,
        });
    }

    let entries = envelope
        .boxes
        .ok_or_else(|| DetectionError::Malformed("missing boxes array".to_string()))?;

    let total = entries.len();
    let boxes: Vec<DetectedBox> = entries.iter().filter_map(parse_entry).collect();
    if boxes.len() < total {
        debug!(dropped = total - boxes.len(), kept = boxes.len(), "dropped malformed detection entries");
    }
    Ok(boxes)
}

/// Parse a detection response from JSON text.
pub fn parse_detection_json(text: &str) -> Result<Vec<DetectedBox>, DetectionError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DetectionError::Malformed(e.to_string()))?;
    parse_detection_response(&value)
}

fn parse_entry(entry: &Value) -> Option<DetectedBox> {
    let raw = RawBox::deserialize(entry).ok()?;
    let rect = Rect::new(raw.x, raw.y, raw.width, raw.height);
    if !rect.is_finite() || rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    Some(DetectedBox {
        rect,
        category: raw.category.as_deref().map(CoverCategory::from_wire),
        text: raw.text,
        confidence: raw.confidence.filter(|c| c.is_finite()),
    })
}

/// Collapse boxes that share a category and coordinates (to 0.1 px).
pub fn dedupe_boxes(boxes: Vec<DetectedBox>) -> Vec<DetectedBox> {
    let mut seen = HashSet::new();
    boxes
        .into_iter()
        .filter(|b| {
            let key = (
                b.category,
                tenths(b.rect.x),
                tenths(b.rect.y),
                tenths(b.rect.right()),
                tenths(b.rect.bottom()),
            );
            seen.insert(key)
        })
        .collect()
}

fn tenths(value: f64) -> i64 {
    (value * 10.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_response() {
        let response = json!({
            "ok": true,
            "boxes": [
                { "x": 10, "y": 20, "width": 30, "height": 40, "category": "date", "text": "01.02.2024", "confidence": 0.9 },
                { "x": 1.5, "y": 2.5, "width": 3, "height": 4, "category": "faces" }
            ]
        });
        let boxes = parse_detection_response(&response).unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].rect, Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(boxes[0].category, Some(CoverCategory::Date));
        assert_eq!(boxes[0].text.as_deref(), Some("01.02.2024"));
        assert_eq!(boxes[1].category, Some(CoverCategory::Faces));
    }

    #[test]
    fn test_parse_drops_malformed_entries() {
        let response = json!({
            "boxes": [
                { "x": 10, "y": 20, "width": 30, "height": 40 },
                { "x": "ten", "y": 20, "width": 30, "height": 40 },
                { "y": 20, "width": 30, "height": 40 },
                { "x": 10, "y": 20, "width": 0, "height": 40 },
                { "x": 10, "y": 20, "width": -5, "height": 40 },
                "garbage",
                null
            ]
        });
        let boxes = parse_detection_response(&response).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].category, None);
    }

    #[test]
    fn test_parse_backend_failure() {
        let response = json!({ "ok": false, "error": "ocr-failed", "message": "boom" });
        let err = parse_detection_response(&response).unwrap_err();
        assert_eq!(err.to_string(), "Detection failed: ocr-failed (boom)");
    }

    #[test]
    fn test_parse_missing_boxes_is_malformed() {
        let err = parse_detection_response(&json!({ "ok": true })).unwrap_err();
        assert!(matches!(err, DetectionError::Malformed(_)));

        let err = parse_detection_response(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, DetectionError::Malformed(_)));
    }

    #[test]
    fn test_parse_json_text() {
        let boxes = parse_detection_json(r#"{"ok":true,"boxes":[{"x":0,"y":0,"width":1,"height":1,"category":"email"}]}"#)
            .unwrap();
        assert_eq!(boxes[0].category, Some(CoverCategory::Emails));
        assert!(parse_detection_json("{").is_err());
    }

    #[test]
    fn test_batch_from_failed_response_is_empty() {
        let batch = DetectionBatch::from_response(
            ImageId::new("img"),
            Point::ORIGIN,
            DetectionFamily::Faces,
            &json!({ "ok": false, "error": "opencv-not-installed" }),
        );
        assert!(batch.boxes.is_empty());
        assert_eq!(batch.family, DetectionFamily::Faces);
    }

    #[test]
    fn test_resolved_category() {
        let uncategorized = DetectedBox::new(Rect::new(0.0, 0.0, 1.0, 1.0), None);
        let faces = DetectionFamily::Faces.authoritative_categories();
        let text = DetectionFamily::Text.authoritative_categories();
        assert_eq!(uncategorized.resolved_category(faces), Some(CoverCategory::Faces));
        assert_eq!(uncategorized.resolved_category(text), None);

        let dated = DetectedBox::new(Rect::new(0.0, 0.0, 1.0, 1.0), Some(CoverCategory::Date));
        assert_eq!(dated.resolved_category(text), Some(CoverCategory::Date));
        assert_eq!(dated.resolved_category(&[]), None);
    }

    #[test]
    fn test_resolved_category_stays_in_family() {
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        let text = DetectionFamily::Text.authoritative_categories();
        let faces = DetectionFamily::Faces.authoritative_categories();

        // A text response can never produce a face or manual box
        let face = DetectedBox::new(rect, Some(CoverCategory::Faces));
        assert_eq!(face.resolved_category(text), None);
        let manual = DetectedBox::new(rect, Some(CoverCategory::Manual));
        assert_eq!(manual.resolved_category(text), None);
        let unknown = DetectedBox::new(rect, Some(CoverCategory::Unknown));
        assert_eq!(unknown.resolved_category(text), None);

        // A single-category family claims whatever it returns
        assert_eq!(manual.resolved_category(faces), Some(CoverCategory::Faces));
    }

    #[test]
    fn test_dedupe_boxes() {
        let a = DetectedBox::new(Rect::new(10.0, 10.0, 5.0, 5.0), Some(CoverCategory::Date));
        let near = DetectedBox::new(Rect::new(10.01, 10.0, 5.0, 5.0), Some(CoverCategory::Date));
        let other_category = DetectedBox::new(Rect::new(10.0, 10.0, 5.0, 5.0), Some(CoverCategory::Iban));
        let boxes = dedupe_boxes(vec![a.clone(), near, other_category.clone()]);
        assert_eq!(boxes, vec![a, other_category]);
    }

    #[test]
    fn test_family_metadata() {
        assert_eq!("ocr".parse::<DetectionFamily>(), Ok(DetectionFamily::Text));
        assert_eq!("faces".parse::<DetectionFamily>(), Ok(DetectionFamily::Faces));
        assert!("plates".parse::<DetectionFamily>().is_err());
        assert_eq!(DetectionFamily::Faces.endpoint(), "/api/faces");
        assert!(DetectionFamily::Text
            .authoritative_categories()
            .contains(&CoverCategory::Emails));
    }

    #[test]
    fn test_face_form_fields() {
        let request = DetectionRequest {
            image_id: ImageId::new("img"),
            family: DetectionFamily::Faces,
            anchor: Point::ORIGIN,
            image_png: Vec::new(),
            file_name: "image.png".to_string(),
            face_params: FaceDetectionParams::default(),
        };
        assert_eq!(
            request.form_fields(),
            vec![("scale_factor", "1.1".to_string()), ("min_neighbors", "5".to_string())]
        );
    }
}
