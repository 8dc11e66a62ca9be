//! Display metrics: the mapping between pointer and image pixel coordinates.
//!
//! # Frames
//!
//! - **Client**: pointer event coordinates reported by the host
//! - **Container**: client coordinates minus the container's top-left,
//!   already in CSS-scaled pixels because the host measures the
//!   container with its bounding box
//! - **Display**: where the zoomed/panned image sits inside the container
//! - **Image**: native image pixels
//!
//! The image is fitted inside the container ("contain" fit), centered,
//! then scaled by the viewport zoom and shifted by the pan offset:
//!
//! ```text
//! container_x = image_x * scale + relative_left
//! client_x    = container_x + container.left
//! ```
//!
//! [`point_to_image_space`] is the exact inverse of that placement.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size};

/// The container's bounding box in client pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerBounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A container with no area cannot display anything.
    pub fn is_collapsed(&self) -> bool {
        self.width.is_nan() || self.height.is_nan() || self.width <= 0.0 || self.height <= 0.0
    }
}

/// Derived placement of the image inside its container.
///
/// Recomputed whenever the container, image, zoom or pan changes and
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Display pixels per image pixel (fit scale times zoom)
    pub scale: f64,
    /// Scale that fits the whole image in the container at zoom 1.0
    pub fit_scale: f64,
    /// Pan offset in container pixels
    pub offset_x: f64,
    pub offset_y: f64,
    /// Native image size
    pub natural_width: f64,
    pub natural_height: f64,
    /// On-screen size of the image
    pub box_width: f64,
    pub box_height: f64,
    /// Image top-left relative to the container's top-left
    pub relative_left: f64,
    pub relative_top: f64,
    /// Container bounds the metrics were computed against
    pub container: ContainerBounds,
}

/// Compute the metrics for the current layout.
///
/// Returns `None` when the image has not loaded (empty natural size), the
/// container is collapsed, or the zoom is not a positive number.
pub fn compute_metrics(
    container: &ContainerBounds,
    natural: Size,
    zoom: f64,
    offset: Point,
) -> Option<Metrics> {
    let zoom_valid = zoom.is_finite() && zoom > 0.0;
    if natural.is_empty() || container.is_collapsed() || !zoom_valid || !offset.is_finite() {
        return None;
    }

    let natural_width = natural.width as f64;
    let natural_height = natural.height as f64;

    let fit_scale = (container.width / natural_width).min(container.height / natural_height);
    let scale = fit_scale * zoom;

    let box_width = natural_width * scale;
    let box_height = natural_height * scale;

    Some(Metrics {
        scale,
        fit_scale,
        offset_x: offset.x,
        offset_y: offset.y,
        natural_width,
        natural_height,
        box_width,
        box_height,
        relative_left: (container.width - box_width) / 2.0 + offset.x,
        relative_top: (container.height - box_height) / 2.0 + offset.y,
        container: *container,
    })
}

/// Map a client (pointer) position to native image pixels.
///
/// The result is not clamped: pointers outside the displayed image map
/// to coordinates outside `[0, natural)`, which drag math clamps later.
pub fn point_to_image_space(client: Point, metrics: &Metrics) -> Point {
    Point::new(
        (client.x - metrics.container.left - metrics.relative_left) / metrics.scale,
        (client.y - metrics.container.top - metrics.relative_top) / metrics.scale,
    )
}

/// Map a native image pixel position to client coordinates.
pub fn image_to_client(point: Point, metrics: &Metrics) -> Point {
    Point::new(
        point.x * metrics.scale + metrics.relative_left + metrics.container.left,
        point.y * metrics.scale + metrics.relative_top + metrics.container.top,
    )
}

/// Map an image-space rectangle to container-relative display pixels,
/// for the host to position overlays.
pub fn rect_to_display(rect: &Rect, metrics: &Metrics) -> Rect {
    Rect::new(
        rect.x * metrics.scale + metrics.relative_left,
        rect.y * metrics.scale + metrics.relative_top,
        rect.width * metrics.scale,
        rect.height * metrics.scale,
    )
}

/// Caches the last computed metrics and tracks when they really change.
///
/// A recomputation that yields a structurally equal value keeps the cached
/// value and its revision, so downstream consumers keyed on the revision
/// are not invalidated by no-op layout passes.
#[derive(Debug, Default)]
pub struct MetricsCache {
    current: Option<Metrics>,
    revision: u64,
}

impl MetricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly computed value. Returns true if it differed.
    pub fn update(&mut self, next: Option<Metrics>) -> bool {
        if self.current == next {
            return false;
        }
        self.current = next;
        self.revision += 1;
        true
    }

    pub fn get(&self) -> Option<&Metrics> {
        self.current.as_ref()
    }

    /// Advances only when the cached value changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> ContainerBounds {
        ContainerBounds::new(20.0, 40.0, 1000.0, 500.0)
    }

    #[test]
    fn test_metrics_none_without_image() {
        assert!(compute_metrics(&container(), Size::new(0, 0), 1.0, Point::ORIGIN).is_none());
    }

    #[test]
    fn test_metrics_none_for_collapsed_container() {
        let collapsed = ContainerBounds::new(0.0, 0.0, 0.0, 300.0);
        assert!(compute_metrics(&collapsed, Size::new(800, 600), 1.0, Point::ORIGIN).is_none());
    }

    #[test]
    fn test_metrics_contain_fit() {
        // 800x600 in 1000x500: height limits, fit = 500/600
        let m = compute_metrics(&container(), Size::new(800, 600), 1.0, Point::ORIGIN).unwrap();
        assert!((m.fit_scale - 500.0 / 600.0).abs() < 1e-12);
        assert!((m.box_height - 500.0).abs() < 1e-9);
        assert!((m.relative_top - 0.0).abs() < 1e-9);
        // Horizontally centered
        assert!((m.relative_left - (1000.0 - m.box_width) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_and_pan_applied() {
        let m = compute_metrics(&container(), Size::new(1000, 500), 2.0, Point::new(30.0, -10.0))
            .unwrap();
        assert!((m.scale - 2.0).abs() < 1e-12);
        assert!((m.box_width - 2000.0).abs() < 1e-9);
        assert!((m.relative_left - (-500.0 + 30.0)).abs() < 1e-9);
        assert!((m.relative_top - (-250.0 - 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_point_to_image_space() {
        let m = compute_metrics(&container(), Size::new(1000, 500), 1.0, Point::ORIGIN).unwrap();
        // Image fills the container exactly at scale 1
        let p = point_to_image_space(Point::new(20.0 + 250.0, 40.0 + 100.0), &m);
        assert!((p.x - 250.0).abs() < 1e-9);
        assert!((p.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rect_to_display() {
        let m = compute_metrics(&container(), Size::new(2000, 1000), 1.0, Point::ORIGIN).unwrap();
        let r = rect_to_display(&Rect::new(100.0, 100.0, 200.0, 50.0), &m);
        assert_eq!(r, Rect::new(50.0, 50.0, 100.0, 25.0));
    }

    #[test]
    fn test_cache_keeps_revision_for_equal_values() {
        let mut cache = MetricsCache::new();
        let m = compute_metrics(&container(), Size::new(800, 600), 1.0, Point::ORIGIN);
        assert!(cache.update(m));
        let revision = cache.revision();

        let again = compute_metrics(&container(), Size::new(800, 600), 1.0, Point::ORIGIN);
        assert!(!cache.update(again));
        assert_eq!(cache.revision(), revision);

        let zoomed = compute_metrics(&container(), Size::new(800, 600), 1.5, Point::ORIGIN);
        assert!(cache.update(zoomed));
        assert_eq!(cache.revision(), revision + 1);
    }

    #[test]
    fn test_cache_invalidates_to_none() {
        let mut cache = MetricsCache::new();
        cache.update(compute_metrics(&container(), Size::new(800, 600), 1.0, Point::ORIGIN));
        assert!(cache.update(None));
        assert!(cache.get().is_none());
    }
}
