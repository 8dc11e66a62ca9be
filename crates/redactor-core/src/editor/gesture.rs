//! Pointer gestures.
//!
//! There is a single gesture slot. Pressing on a target while another
//! gesture is active ends the old one first, so crop and cover drags can
//! never run at the same time. The host keeps its global move/up
//! listeners installed for as long as [`Editor::has_active_gesture`]
//! returns true.

use tracing::debug;

use crate::drag::{DragKind, DragSession};
use crate::geometry::Point;
use crate::metrics::point_to_image_space;

use super::{Editor, EditorEvent, GestureTarget, PointerInput};

/// The gesture currently holding the pointer.
#[derive(Debug, Clone, Copy)]
pub(super) struct ActiveGesture {
    pub(super) target: GestureTarget,
    session: DragSession,
    /// A pointer move changed the target
    changed: bool,
}

impl Editor {
    /// Start dragging `target`. Returns false when the press is ignored:
    /// no layout yet, an unknown cover, or a crop target while no crop
    /// selection is active.
    pub fn pointer_down(&mut self, target: GestureTarget, kind: DragKind, input: PointerInput) -> bool {
        self.end_gesture();
        let Some(metrics) = self.metrics.get().copied() else {
            return false;
        };
        let point = point_to_image_space(input.client(), &metrics);
        let Some(cur) = self.current() else {
            return false;
        };
        let min_size = cur.config.min_rect_size;

        let session = match target {
            GestureTarget::Crop => {
                let Some(draft) = cur.state.crop.draft() else {
                    return false;
                };
                DragSession::begin(kind, draft, point, cur.source.size().to_rect(), min_size)
            }
            GestureTarget::Cover(id) => {
                let frame = cur.frame();
                let covers = &cur.state.covers;
                let Some(cover) = covers.get(id) else {
                    return false;
                };
                let origin = covers.origin();
                DragSession::begin(
                    kind,
                    cover.rect,
                    Point::new(point.x - origin.x, point.y - origin.y),
                    covers.bounds(&frame),
                    min_size,
                )
            }
        };
        let Some(session) = session else {
            return false;
        };
        if let GestureTarget::Cover(_) = target {
            cur.state.undo.begin_batch();
        }

        debug!(gesture = ?target, ?kind, "gesture started");
        self.gesture = Some(ActiveGesture {
            target,
            session,
            changed: false,
        });
        true
    }

    /// Feed a pointer move to the active gesture. Returns true when the
    /// target rectangle changed.
    ///
    /// Only the first change of a cover drag records an undo snapshot.
    pub fn pointer_move(&mut self, input: PointerInput) -> bool {
        let Some(gesture) = self.gesture else {
            return false;
        };
        let Some(metrics) = self.metrics.get().copied() else {
            return false;
        };
        let point = point_to_image_space(input.client(), &metrics);
        let Some(cur) = self.current() else {
            return false;
        };

        let changed = match gesture.target {
            GestureTarget::Crop => {
                let Some(rect) = gesture.session.update(Some(point), input.keep_aspect) else {
                    return false;
                };
                let crop = &mut cur.state.crop;
                if !crop.is_selecting() || crop.draft() == Some(rect) {
                    false
                } else {
                    crop.set_draft(rect);
                    true
                }
            }
            GestureTarget::Cover(id) => {
                let origin = cur.state.covers.origin();
                let local = Point::new(point.x - origin.x, point.y - origin.y);
                let Some(rect) = gesture.session.update(Some(local), input.keep_aspect) else {
                    return false;
                };
                match cur.state.covers.get(id) {
                    Some(cover) if cover.rect != rect => {
                        let frame = cur.frame();
                        cur.state.record_undo();
                        cur.state.covers.update_rect(id, rect, &frame)
                    }
                    _ => false,
                }
            }
        };

        if changed {
            if let Some(active) = self.gesture.as_mut() {
                active.changed = true;
            }
        }
        changed
    }

    /// Release the pointer. Returns true when a gesture ended.
    pub fn pointer_up(&mut self) -> bool {
        self.end_gesture()
    }

    pub fn has_active_gesture(&self) -> bool {
        self.gesture.is_some()
    }

    /// End the active gesture, keeping what it did.
    pub(super) fn end_gesture(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        if let GestureTarget::Cover(_) = gesture.target {
            if let Some(cur) = self.current() {
                cur.state.undo.end_batch();
            }
            if gesture.changed {
                self.events.push(EditorEvent::CoversChanged);
            }
        }
        debug!(gesture = ?gesture.target, changed = gesture.changed, "gesture ended");
        true
    }

    /// End the active gesture only if it is a crop drag.
    pub(super) fn end_crop_gesture(&mut self) {
        if self.gesture.is_some_and(|g| g.target == GestureTarget::Crop) {
            self.end_gesture();
        }
    }

    /// Abort the active gesture and put its target back where it started.
    ///
    /// A cover drag that already recorded its undo snapshot is rolled
    /// back from that snapshot, which is then discarded.
    pub(super) fn cancel_gesture(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        let Some(cur) = self.current() else {
            return true;
        };
        match gesture.target {
            GestureTarget::Crop => cur.state.crop.set_draft(gesture.session.start_rect()),
            GestureTarget::Cover(_) => {
                if gesture.changed {
                    if let Some(snapshot) = cur.state.undo.pop() {
                        cur.state.covers.restore(&snapshot);
                    }
                }
                cur.state.undo.end_batch();
            }
        }
        debug!(gesture = ?gesture.target, "gesture cancelled");
        true
    }
}
