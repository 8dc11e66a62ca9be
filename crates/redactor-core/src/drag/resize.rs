//! Move and handle-resize calculations.

use crate::geometry::{Point, Rect};

use super::Handle;

/// Translate `start` by the pointer delta, clamped inside `bounds`.
///
/// # Arguments
///
/// * `start` - Rectangle at the beginning of the drag
/// * `start_point` - Pointer position (image space) when the drag began
/// * `point` - Current pointer position, `None` when the event could not
///   be mapped to image space
/// * `bounds` - Region the rectangle must stay within
/// * `min_size` - Smallest allowed width/height
///
/// # Returns
///
/// The moved rectangle, or `None` (no change) for missing or non-finite input.
pub fn calculate_move_rect(
    start: &Rect,
    start_point: Point,
    point: Option<Point>,
    bounds: &Rect,
    min_size: f64,
) -> Option<Rect> {
    let point = point.filter(Point::is_finite)?;
    if !start_point.is_finite() || !start.is_finite() || !has_area(bounds) {
        return None;
    }

    let moved = start.translate(point.x - start_point.x, point.y - start_point.y);
    Some(moved.clamp_within(bounds, min_size))
}

/// Resize `start` by dragging `handle` to `point`.
///
/// The edge (or corner) opposite the handle stays fixed and the dragged
/// edges follow the pointer. Pulling past the fixed edge mirrors the
/// rectangle to the other side, unless the bounds leave no room there.
///
/// With `aspect_lock` set and a corner handle, the width follows the
/// pointer and the height is always derived from that width, so the ratio
/// holds exactly whichever axis the pointer favors. If the derived height
/// does not fit, both dimensions shrink together. Edge handles ignore the
/// lock since they only change one dimension.
///
/// # Returns
///
/// The resized rectangle, or `None` (no change) for missing or non-finite input.
pub fn calculate_handle_rect(
    handle: Handle,
    start: &Rect,
    point: Option<Point>,
    aspect_lock: Option<f64>,
    bounds: &Rect,
    min_size: f64,
) -> Option<Rect> {
    let point = point.filter(Point::is_finite)?;
    if !start.is_finite() || !has_area(bounds) {
        return None;
    }

    let start = start.clamp_within(bounds, min_size);
    let (dir_x, dir_y) = handle.direction();

    let aspect = aspect_lock.filter(|a| handle.is_corner() && a.is_finite() && *a > 0.0);
    // Under a lock the minimum of one axis implies a minimum for the other.
    let (min_w, min_h) = match aspect {
        Some(a) => (min_size.max(min_size * a), min_size.max(min_size / a)),
        None => (min_size, min_size),
    };

    let mut x_axis = (dir_x != 0).then(|| {
        let fixed = if dir_x > 0 { start.x } else { start.right() };
        AxisDrag::new(fixed, dir_x, point.x, bounds.x, bounds.right(), min_w)
    });
    let mut y_axis = (dir_y != 0).then(|| {
        let fixed = if dir_y > 0 { start.y } else { start.bottom() };
        AxisDrag::new(fixed, dir_y, point.y, bounds.y, bounds.bottom(), min_h)
    });

    if let (Some(a), Some(x), Some(y)) = (aspect, x_axis.as_mut(), y_axis.as_mut()) {
        let mut width = x.len;
        let mut height = width / a;
        if height > y.room {
            height = y.room;
            width = height * a;
        }
        x.len = width;
        y.len = height;
    }

    let (x, width) = match x_axis {
        Some(axis) => axis.span(),
        None => (start.x, start.width),
    };
    let (y, height) = match y_axis {
        Some(axis) => axis.span(),
        None => (start.y, start.height),
    };

    Some(Rect::new(x, y, width, height))
}

fn has_area(bounds: &Rect) -> bool {
    bounds.is_finite() && bounds.width > 0.0 && bounds.height > 0.0
}

/// One axis of a handle drag: a fixed edge and a span growing away from it.
#[derive(Debug, Clone, Copy)]
struct AxisDrag {
    /// Coordinate of the edge that does not move
    fixed: f64,
    /// Side of `fixed` the span extends to
    dir: i8,
    /// Current span length
    len: f64,
    /// Space available between `fixed` and the bound on the `dir` side
    room: f64,
}

impl AxisDrag {
    fn new(fixed: f64, natural_dir: i8, pointer: f64, lo: f64, hi: f64, min_len: f64) -> Self {
        let pointer = pointer.clamp(lo, hi);
        let delta = pointer - fixed;
        let room_on = |dir: i8| if dir > 0 { hi - fixed } else { fixed - lo };

        let pointer_dir = if delta > 0.0 {
            1
        } else if delta < 0.0 {
            -1
        } else {
            natural_dir
        };

        // Mirror only if there is space for a minimum-size span on the far side.
        let dir = if pointer_dir != natural_dir && room_on(pointer_dir) < min_len {
            natural_dir
        } else {
            pointer_dir
        };
        let room = room_on(dir);
        let wanted = if dir == pointer_dir { delta.abs() } else { 0.0 };

        Self {
            fixed,
            dir,
            len: wanted.clamp(min_len, room.max(min_len)),
            room,
        }
    }

    /// `(start, length)` of the span.
    fn span(self) -> (f64, f64) {
        if self.dir > 0 {
            (self.fixed, self.len)
        } else {
            (self.fixed - self.len, self.len)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::new(0.0, 0.0, 800.0, 600.0)
    }

    fn start() -> Rect {
        Rect::new(100.0, 100.0, 200.0, 100.0)
    }

    #[test]
    fn test_move_translates() {
        let rect = calculate_move_rect(
            &start(),
            Point::new(150.0, 150.0),
            Some(Point::new(170.0, 140.0)),
            &bounds(),
            1.0,
        )
        .unwrap();
        assert_eq!(rect, Rect::new(120.0, 90.0, 200.0, 100.0));
    }

    #[test]
    fn test_move_clamps_to_bounds() {
        let rect = calculate_move_rect(
            &start(),
            Point::new(150.0, 150.0),
            Some(Point::new(5000.0, -5000.0)),
            &bounds(),
            1.0,
        )
        .unwrap();
        assert_eq!(rect, Rect::new(600.0, 0.0, 200.0, 100.0));
    }

    #[test]
    fn test_move_without_point_is_no_change() {
        let result = calculate_move_rect(&start(), Point::new(1.0, 1.0), None, &bounds(), 1.0);
        assert!(result.is_none());

        let nan = Some(Point::new(f64::NAN, 3.0));
        assert!(calculate_move_rect(&start(), Point::new(1.0, 1.0), nan, &bounds(), 1.0).is_none());
    }

    #[test]
    fn test_east_handle_changes_width_only() {
        let rect = calculate_handle_rect(
            Handle::East,
            &start(),
            Some(Point::new(400.0, 999.0)),
            None,
            &bounds(),
            1.0,
        )
        .unwrap();
        assert_eq!(rect, Rect::new(100.0, 100.0, 300.0, 100.0));
    }

    #[test]
    fn test_north_west_handle_keeps_south_east_corner() {
        let rect = calculate_handle_rect(
            Handle::NorthWest,
            &start(),
            Some(Point::new(50.0, 20.0)),
            None,
            &bounds(),
            1.0,
        )
        .unwrap();
        assert_eq!(rect, Rect::new(50.0, 20.0, 250.0, 180.0));
    }

    #[test]
    fn test_dragging_past_opposite_edge_mirrors() {
        // East handle dragged 50px left of the fixed west edge
        let rect = calculate_handle_rect(
            Handle::East,
            &start(),
            Some(Point::new(50.0, 150.0)),
            None,
            &bounds(),
            1.0,
        )
        .unwrap();
        assert_eq!(rect, Rect::new(50.0, 100.0, 50.0, 100.0));
    }

    #[test]
    fn test_collapsed_drag_keeps_minimum_size() {
        let rect = calculate_handle_rect(
            Handle::South,
            &start(),
            Some(Point::new(0.0, 100.0)),
            None,
            &bounds(),
            1.0,
        )
        .unwrap();
        assert_eq!(rect.height, 1.0);
        assert_eq!(rect.y, 100.0);
    }

    #[test]
    fn test_mirror_blocked_at_bounds_edge() {
        // Rect touching the left bound: pulling the east edge past it cannot mirror
        let rect = calculate_handle_rect(
            Handle::East,
            &Rect::new(0.0, 0.0, 100.0, 100.0),
            Some(Point::new(-50.0, 50.0)),
            None,
            &bounds(),
            1.0,
        )
        .unwrap();
        assert_eq!(rect, Rect::new(0.0, 0.0, 1.0, 100.0));
    }

    #[test]
    fn test_aspect_lock_derives_height_from_width() {
        // 2:1 rect, pointer favors the vertical axis
        let rect = calculate_handle_rect(
            Handle::SouthEast,
            &start(),
            Some(Point::new(400.0, 500.0)),
            Some(2.0),
            &bounds(),
            1.0,
        )
        .unwrap();
        assert_eq!(rect, Rect::new(100.0, 100.0, 300.0, 150.0));
    }

    #[test]
    fn test_aspect_lock_shrinks_when_height_does_not_fit() {
        let rect = calculate_handle_rect(
            Handle::SouthEast,
            &Rect::new(0.0, 500.0, 40.0, 20.0),
            Some(Point::new(800.0, 600.0)),
            Some(2.0),
            &bounds(),
            1.0,
        )
        .unwrap();
        // Only 100px of vertical room below the fixed top edge
        assert_eq!(rect, Rect::new(0.0, 500.0, 200.0, 100.0));
    }

    #[test]
    fn test_aspect_lock_ignored_for_edge_handles() {
        let rect = calculate_handle_rect(
            Handle::East,
            &start(),
            Some(Point::new(500.0, 150.0)),
            Some(2.0),
            &bounds(),
            1.0,
        )
        .unwrap();
        assert_eq!(rect, Rect::new(100.0, 100.0, 400.0, 100.0));
    }

    #[test]
    fn test_handle_without_point_is_no_change() {
        let result = calculate_handle_rect(Handle::North, &start(), None, None, &bounds(), 1.0);
        assert!(result.is_none());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
