//! A single drag gesture in progress.

use crate::geometry::{Point, Rect};

use super::{calculate_handle_rect, calculate_move_rect, DragKind};

/// Everything captured when a drag starts.
///
/// Each pointer move is computed from the drag-start values, never from
/// the previous move, so a gesture cannot drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    kind: DragKind,
    start_rect: Rect,
    start_point: Point,
    /// Width/height ratio at drag start, used by the aspect lock
    aspect: f64,
    bounds: Rect,
    min_size: f64,
}

impl DragSession {
    /// Capture a drag start. Returns `None` for non-finite input.
    ///
    /// The start rectangle is clamped into `bounds` first, so the aspect
    /// ratio recorded here is the one the user actually sees.
    pub fn begin(
        kind: DragKind,
        start_rect: Rect,
        start_point: Point,
        bounds: Rect,
        min_size: f64,
    ) -> Option<Self> {
        if !start_rect.is_finite() || !start_point.is_finite() || !bounds.is_finite() {
            return None;
        }
        let start_rect = start_rect.clamp_within(&bounds, min_size);
        Some(Self {
            kind,
            start_rect,
            start_point,
            aspect: start_rect.aspect(),
            bounds,
            min_size,
        })
    }

    pub fn kind(&self) -> DragKind {
        self.kind
    }

    pub fn start_rect(&self) -> Rect {
        self.start_rect
    }

    /// Rectangle for the current pointer position, or `None` for no change.
    pub fn update(&self, point: Option<Point>, keep_aspect: bool) -> Option<Rect> {
        match self.kind {
            DragKind::Move => calculate_move_rect(
                &self.start_rect,
                self.start_point,
                point,
                &self.bounds,
                self.min_size,
            ),
            DragKind::Resize(handle) => calculate_handle_rect(
                handle,
                &self.start_rect,
                point,
                keep_aspect.then_some(self.aspect),
                &self.bounds,
                self.min_size,
            ),
        }
    }
}
