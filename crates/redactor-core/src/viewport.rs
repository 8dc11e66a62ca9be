//! Viewport transform: zoom factor and pan offset.
//!
//! The viewport is a display-only concern. Nothing here is ever used when
//! exporting, so zooming or panning can never shift exported pixels.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::metrics::{point_to_image_space, Metrics};

/// Zoom and pan state of the image view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Zoom factor relative to the contain-fit scale (1.0 = fitted)
    scale: f64,
    /// Pan offset in container pixels
    offset: Point,
    min_scale: f64,
    max_scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.1, 8.0)
    }
}

impl Viewport {
    /// Create a fitted, unpanned viewport with the given zoom limits.
    pub fn new(min_scale: f64, max_scale: f64) -> Self {
        Self {
            scale: 1.0_f64.clamp(min_scale, max_scale),
            offset: Point::ORIGIN,
            min_scale,
            max_scale,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Set the zoom factor, clamped to the configured limits.
    ///
    /// Non-finite values are ignored.
    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() {
            self.scale = scale.clamp(self.min_scale, self.max_scale);
        }
    }

    /// Multiply the zoom factor, keeping the container center fixed.
    pub fn zoom_by(&mut self, factor: f64) {
        let before = self.scale;
        self.set_scale(before * factor);
        // The image is centered, so the offset scales with the zoom to keep
        // the content under the container center in place.
        let ratio = self.scale / before;
        self.offset = Point::new(self.offset.x * ratio, self.offset.y * ratio);
    }

    /// Multiply the zoom factor, keeping the image pixel under `client` fixed.
    ///
    /// `metrics` must describe the layout before the zoom.
    pub fn zoom_around(&mut self, factor: f64, client: Point, metrics: &Metrics) {
        if !client.is_finite() {
            return;
        }
        let anchor = point_to_image_space(client, metrics);
        self.set_scale(self.scale * factor);

        let scale = metrics.fit_scale * self.scale;
        let box_width = metrics.natural_width * scale;
        let box_height = metrics.natural_height * scale;
        let container = &metrics.container;

        // Solve `client = anchor * scale + centered + offset + container.origin`
        self.offset = Point::new(
            client.x - container.left - anchor.x * scale - (container.width - box_width) / 2.0,
            client.y - container.top - anchor.y * scale - (container.height - box_height) / 2.0,
        );
    }

    /// Shift the view by a number of container pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.offset = Point::new(self.offset.x + dx, self.offset.y + dy);
        }
    }

    /// Back to a fitted, centered view.
    pub fn reset(&mut self) {
        *self = Self::new(self.min_scale, self.max_scale);
    }
}
