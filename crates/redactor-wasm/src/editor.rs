//! WASM bindings for the interactive editor.
//!
//! [`JsEditor`] owns a core [`Editor`] and exposes it with JavaScript
//! friendly argument types: plain numbers and strings for pointer input,
//! serde values for rectangles, geometry and events.

use redactor_core::detect::DetectionBatch;
use redactor_core::{
    Color, ContainerBounds, CoverId, Editor, EditorConfig, EditorKey, ImageId, MergeOutcome,
    Point, PointerInput, Rect,
};
use wasm_bindgen::prelude::*;

use crate::types::{parse_drag_kind, parse_family, parse_target, phase_name, JsExportResult};

fn js_error(message: impl ToString) -> JsValue {
    JsValue::from_str(&message.to_string())
}

/// Interactive crop and cover editor.
///
/// # Example (TypeScript)
/// ```typescript
/// const editor = new JsEditor(undefined);
/// editor.load_image("scan-1", "scan.jpg", bytes);
/// editor.set_container(rect.left, rect.top, rect.width, rect.height);
///
/// editor.start_crop();
/// editor.pointer_down("crop", undefined, "se", e.clientX, e.clientY, e.shiftKey);
/// editor.pointer_move(e.clientX, e.clientY, e.shiftKey);
/// editor.pointer_up();
/// editor.finish_crop();
///
/// const result = editor.get_cropped_export();
/// ```
#[wasm_bindgen]
pub struct JsEditor {
    inner: Editor,
}

#[wasm_bindgen]
impl JsEditor {
    /// Create an editor. Pass `undefined` or `null` for the default
    /// configuration, or an object with any `EditorConfig` fields.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsEditor, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(js_error)?
        };
        let inner = Editor::with_config(config).map_err(js_error)?;
        Ok(Self { inner })
    }

    // =========================================================================
    // Source image
    // =========================================================================

    /// Decode and load an image. Loading a new id discards the editing
    /// state of every other image.
    pub fn load_image(
        &mut self,
        id: &str,
        file_name: Option<String>,
        bytes: &[u8],
    ) -> Result<(), JsValue> {
        self.inner
            .load_source(ImageId::new(id), file_name, bytes)
            .map_err(js_error)
    }

    pub fn clear_image(&mut self) {
        self.inner.clear_source();
    }

    /// Id of the loaded image, if any
    #[wasm_bindgen(getter)]
    pub fn image_id(&self) -> Option<String> {
        self.inner.source().map(|s| s.id.as_str().to_string())
    }

    // =========================================================================
    // Layout and view
    // =========================================================================

    /// Report the container's bounding client rect.
    pub fn set_container(&mut self, left: f64, top: f64, width: f64, height: f64) {
        self.inner
            .set_container(ContainerBounds::new(left, top, width, height));
    }

    /// Bumps whenever the displayed image moved or was rescaled.
    #[wasm_bindgen(getter)]
    pub fn metrics_revision(&self) -> f64 {
        self.inner.metrics_revision() as f64
    }

    /// Current zoom factor relative to the contain fit
    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> f64 {
        self.inner.viewport().scale()
    }

    pub fn zoom_in(&mut self) {
        self.inner.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.inner.zoom_out();
    }

    /// Zoom by `factor` keeping the point under the cursor fixed.
    pub fn zoom_at(&mut self, factor: f64, client_x: f64, client_y: f64) {
        self.inner.zoom_at(factor, Point::new(client_x, client_y));
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.inner.pan_by(dx, dy);
    }

    pub fn reset_view(&mut self) {
        self.inner.reset_view();
    }

    /// Convert a client point to image pixels, or `undefined` before layout.
    pub fn point_to_image(&self, client_x: f64, client_y: f64) -> Result<JsValue, JsValue> {
        let point = self.inner.point_to_image(Point::new(client_x, client_y));
        serde_wasm_bindgen::to_value(&point).map_err(js_error)
    }

    // =========================================================================
    // Pointer and keyboard
    // =========================================================================

    /// Start a drag.
    ///
    /// `target` is `"crop"` or `"cover"` (with `cover_id`), `kind` is
    /// `"move"` or a handle name (`n`, `s`, `e`, `w`, `ne`, `nw`, `se`, `sw`).
    /// Returns false when the press was ignored.
    pub fn pointer_down(
        &mut self,
        target: &str,
        cover_id: Option<u32>,
        kind: &str,
        client_x: f64,
        client_y: f64,
        keep_aspect: bool,
    ) -> Result<bool, JsValue> {
        let target = parse_target(target, cover_id).map_err(js_error)?;
        let kind = parse_drag_kind(kind).map_err(js_error)?;
        let input = PointerInput::new(client_x, client_y).with_aspect_lock(keep_aspect);
        Ok(self.inner.pointer_down(target, kind, input))
    }

    pub fn pointer_move(&mut self, client_x: f64, client_y: f64, keep_aspect: bool) -> bool {
        let input = PointerInput::new(client_x, client_y).with_aspect_lock(keep_aspect);
        self.inner.pointer_move(input)
    }

    pub fn pointer_up(&mut self) -> bool {
        self.inner.pointer_up()
    }

    /// While true the host keeps its window-level move/up listeners.
    #[wasm_bindgen(getter)]
    pub fn has_active_gesture(&self) -> bool {
        self.inner.has_active_gesture()
    }

    /// Handle a `KeyboardEvent.key`. Returns true when the key was consumed
    /// and the host should call `preventDefault`.
    pub fn key_down(&mut self, key: &str, ctrl_or_meta: bool) -> bool {
        match EditorKey::from_dom(key, ctrl_or_meta) {
            Some(key) => self.inner.key_down(key),
            None => false,
        }
    }

    // =========================================================================
    // Crop
    // =========================================================================

    /// `"idle"` or `"selecting"`
    #[wasm_bindgen(getter)]
    pub fn crop_phase(&self) -> String {
        phase_name(self.inner.crop_phase()).to_string()
    }

    pub fn start_crop(&mut self) -> bool {
        self.inner.start_crop()
    }

    pub fn finish_crop(&mut self) -> bool {
        self.inner.finish_crop()
    }

    /// Start or finish the crop selection; returns the new phase.
    pub fn toggle_crop(&mut self) -> String {
        phase_name(self.inner.toggle_crop()).to_string()
    }

    pub fn cancel_crop(&mut self) -> bool {
        self.inner.cancel_crop()
    }

    pub fn draft_rect(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.draft_rect()).map_err(js_error)
    }

    pub fn applied_rect(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.applied_rect()).map_err(js_error)
    }

    /// Replace the applied crop (`{x, y, width, height}`), or remove it
    /// with `null`.
    pub fn set_applied_crop_rect(&mut self, rect: JsValue) -> Result<bool, JsValue> {
        let rect: Option<Rect> = serde_wasm_bindgen::from_value(rect).map_err(js_error)?;
        Ok(self.inner.set_applied_crop_rect(rect))
    }

    // =========================================================================
    // Covers
    // =========================================================================

    /// Add a manual cover centred in the visible area; returns its id.
    pub fn add_manual_cover(&mut self) -> Option<u32> {
        self.inner.add_manual_cover().map(|id| id.0)
    }

    pub fn remove_cover(&mut self, id: u32) -> bool {
        self.inner.remove_cover(CoverId(id))
    }

    /// Set a cover's rectangle, relative to the cover origin.
    pub fn update_cover_rect(&mut self, id: u32, rect: JsValue) -> Result<bool, JsValue> {
        let rect: Rect = serde_wasm_bindgen::from_value(rect).map_err(js_error)?;
        Ok(self.inner.update_cover_rect(CoverId(id), rect))
    }

    /// Select the visible categories by their display labels.
    pub fn set_filters(&mut self, labels: Vec<String>) {
        self.inner.set_filter_labels(labels);
    }

    /// Display labels of the categories present, in canonical order
    pub fn available_filters(&self) -> Vec<String> {
        self.inner
            .available_filters()
            .into_iter()
            .map(|c| c.label().to_string())
            .collect()
    }

    pub fn active_filters(&self) -> Vec<String> {
        self.inner
            .active_filters()
            .into_iter()
            .map(|c| c.label().to_string())
            .collect()
    }

    pub fn toggle_covers(&mut self) -> bool {
        self.inner.toggle_covers()
    }

    /// Set the global cover color from a `#rrggbb` string.
    pub fn set_color(&mut self, color: &str) -> Result<bool, JsValue> {
        let color: Color = color.parse().map_err(js_error)?;
        Ok(self.inner.set_color(color))
    }

    /// Override one cover's color, or clear the override with `undefined`.
    pub fn set_cover_color(&mut self, id: u32, color: Option<String>) -> Result<bool, JsValue> {
        let color = color
            .map(|c| c.parse::<Color>())
            .transpose()
            .map_err(js_error)?;
        Ok(self.inner.set_cover_override_color(CoverId(id), color))
    }

    // =========================================================================
    // Detection
    // =========================================================================

    /// Cover origin to send back with the detection result.
    pub fn detection_anchor(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.detection_anchor()).map_err(js_error)
    }

    /// The crop-applied image to upload for detection, without covers.
    pub fn detection_image(&self) -> Option<JsExportResult> {
        self.inner.detection_image().map(JsExportResult::from)
    }

    /// Endpoint path for a detection family (`"text"` or `"faces"`).
    pub fn detection_endpoint(&self, family: &str) -> Result<String, JsValue> {
        let family = parse_family(family).map_err(js_error)?;
        Ok(family.endpoint().to_string())
    }

    /// Merge a detection response.
    ///
    /// `response` is the parsed JSON body, or `undefined` when the request
    /// failed; either way the family's categories are replaced. Returns
    /// the merge statistics, or `null` when the result was for an image
    /// that is no longer loaded. A non-finite anchor is an error.
    pub fn merge_detected_boxes(
        &mut self,
        image_id: &str,
        family: &str,
        anchor_x: f64,
        anchor_y: f64,
        response: JsValue,
    ) -> Result<JsValue, JsValue> {
        let family = parse_family(family).map_err(js_error)?;
        let image_id = ImageId::new(image_id);
        let anchor = Point::new(anchor_x, anchor_y);

        let batch = if response.is_undefined() || response.is_null() {
            DetectionBatch::failed(image_id, anchor, family)
        } else {
            let value: serde_json::Value =
                serde_wasm_bindgen::from_value(response).map_err(js_error)?;
            DetectionBatch::from_response(image_id, anchor, family, &value)
        };

        match self.inner.merge_detection(batch) {
            MergeOutcome::Merged(stats) => {
                serde_wasm_bindgen::to_value(&stats).map_err(js_error)
            }
            MergeOutcome::Stale | MergeOutcome::NoSource => Ok(JsValue::NULL),
            MergeOutcome::InvalidAnchor => Err(js_error("Detection anchor must be finite")),
        }
    }

    // =========================================================================
    // Export, undo and state
    // =========================================================================

    /// Encode the applied crop with visible covers painted on.
    pub fn get_cropped_export(&self) -> Option<JsExportResult> {
        self.inner.get_cropped_export().map(JsExportResult::from)
    }

    pub fn undo(&mut self) -> bool {
        self.inner.undo()
    }

    #[wasm_bindgen(getter)]
    pub fn can_undo(&self) -> bool {
        self.inner.can_undo()
    }

    /// Everything the host draws, as a plain object.
    pub fn geometry(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.geometry()).map_err(js_error)
    }

    /// Drain queued editor events.
    pub fn take_events(&mut self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.take_events()).map_err(js_error)
    }
}
