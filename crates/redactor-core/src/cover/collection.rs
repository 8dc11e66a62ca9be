//! Cover collection state for one source image.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::detect::{dedupe_boxes, DetectedBox};
use crate::geometry::{Point, Rect, Size};
use crate::undo::UndoSnapshot;

use super::{Color, CoverCategory};

/// Anchors closer than this are treated as the same origin.
const ORIGIN_EPSILON: f64 = 1e-6;

/// Identifier of a cover box, unique within one image's collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverId(pub u32);

impl fmt::Display for CoverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cover-{}", self.0)
    }
}

/// A single cover rectangle, relative to the collection's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverBox {
    pub id: CoverId,
    #[serde(flatten)]
    pub rect: Rect,
    pub category: CoverCategory,
    /// Per-box override of the global cover color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

/// The image context cover operations are bounded by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFrame {
    pub natural: Size,
    pub applied_crop: Option<Rect>,
    pub min_size: f64,
}

/// What a detection merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Boxes dropped because the anchor moved
    pub discarded: usize,
    /// Boxes of an authoritative category that were replaced
    pub replaced: usize,
    /// Detected boxes appended
    pub added: usize,
}

/// Cover boxes, their origin, filters and color for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverState {
    boxes: Vec<CoverBox>,
    origin: Point,
    filters: BTreeSet<CoverCategory>,
    enabled: bool,
    color: Color,
    next_id: u32,
}

impl CoverState {
    pub fn new(color: Color) -> Self {
        Self {
            boxes: Vec::new(),
            origin: Point::ORIGIN,
            filters: BTreeSet::new(),
            enabled: false,
            color,
            next_id: 1,
        }
    }

    pub fn boxes(&self) -> &[CoverBox] {
        &self.boxes
    }

    pub fn get(&self, id: CoverId) -> Option<&CoverBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn filters(&self) -> &BTreeSet<CoverCategory> {
        &self.filters
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// The rectangle cover coordinates are confined to, in cover space.
    ///
    /// Covers anchored to the applied crop are bounded by that crop;
    /// otherwise by the whole image, which starts at `-origin` in cover
    /// space.
    pub fn bounds(&self, frame: &CoverFrame) -> Rect {
        let min = frame.min_size;
        match frame.applied_crop {
            Some(crop) if same_point(crop.origin(), self.origin) => {
                Rect::new(0.0, 0.0, crop.width.max(min), crop.height.max(min))
            }
            _ => Rect::new(
                -self.origin.x,
                -self.origin.y,
                (frame.natural.width as f64).max(min),
                (frame.natural.height as f64).max(min),
            ),
        }
    }

    /// Categories present among the boxes, in canonical order.
    pub fn available_filters(&self) -> Vec<CoverCategory> {
        self.present_categories().into_iter().collect()
    }

    /// Active filters, in canonical order.
    pub fn active_filters(&self) -> Vec<CoverCategory> {
        self.filters.iter().copied().collect()
    }

    pub fn is_visible(&self, cover: &CoverBox) -> bool {
        self.enabled && self.filters.contains(&cover.category)
    }

    pub fn visible_boxes(&self) -> impl Iterator<Item = &CoverBox> {
        self.boxes.iter().filter(|b| self.is_visible(b))
    }

    /// A box's rectangle in absolute image pixels.
    pub fn absolute_rect(&self, cover: &CoverBox) -> Rect {
        cover.rect.translate(self.origin.x, self.origin.y)
    }

    /// Color a box is painted with.
    pub fn effective_color(&self, cover: &CoverBox) -> Color {
        cover.color.unwrap_or(self.color)
    }

    /// Visible boxes as absolute rectangles with their paint color.
    pub fn paint_list(&self) -> Vec<(Rect, Color)> {
        self.visible_boxes()
            .map(|b| (self.absolute_rect(b), self.effective_color(b)))
            .collect()
    }

    /// Insert a centered manual box sized to `fraction` of the bounds.
    ///
    /// An empty collection is first re-anchored to the applied crop (or
    /// the image origin), so new covers follow the crop the user sees.
    pub fn add_manual(&mut self, frame: &CoverFrame, fraction: f64) -> CoverId {
        if self.boxes.is_empty() {
            self.origin = frame
                .applied_crop
                .map(|crop| crop.origin())
                .unwrap_or(Point::ORIGIN);
        }
        let bounds = self.bounds(frame);
        let rect = Rect::centered_in(&bounds, fraction).clamp_within(&bounds, frame.min_size);
        let id = self.insert(rect, CoverCategory::Manual, None);
        self.filters.insert(CoverCategory::Manual);
        self.enabled = true;
        debug!(%id, ?rect, "manual cover added");
        id
    }

    /// Delete a box. Returns false when the id is unknown.
    pub fn remove(&mut self, id: CoverId) -> bool {
        let before = self.boxes.len();
        self.boxes.retain(|b| b.id != id);
        if self.boxes.len() == before {
            return false;
        }
        self.prune_filters();
        debug!(%id, "cover removed");
        true
    }

    /// Replace a box's rectangle, clamped into the cover bounds.
    pub fn update_rect(&mut self, id: CoverId, rect: Rect, frame: &CoverFrame) -> bool {
        if !rect.is_finite() {
            return false;
        }
        let bounds = self.bounds(frame);
        match self.boxes.iter_mut().find(|b| b.id == id) {
            Some(cover) => {
                cover.rect = rect.clamp_within(&bounds, frame.min_size);
                true
            }
            None => false,
        }
    }

    /// Set the active filters. Categories with no boxes are ignored, and
    /// an empty result disables covers.
    pub fn set_filters(&mut self, filters: impl IntoIterator<Item = CoverCategory>) {
        let present = self.present_categories();
        self.filters = filters
            .into_iter()
            .filter(|c| present.contains(c))
            .collect();
        self.enabled = !self.filters.is_empty();
    }

    /// Flip covers on or off and return the new state.
    ///
    /// Turning covers on with no active filter activates every present
    /// category; with no boxes at all covers stay off.
    pub fn toggle_enabled(&mut self) -> bool {
        if self.enabled {
            self.enabled = false;
        } else {
            if self.filters.is_empty() {
                self.filters = self.present_categories();
            }
            self.enabled = !self.filters.is_empty();
        }
        self.enabled
    }

    /// Change the global color. Returns false when it is unchanged.
    pub fn set_color(&mut self, color: Color) -> bool {
        if self.color == color {
            return false;
        }
        self.color = color;
        true
    }

    /// Set or clear a box's color override.
    pub fn set_box_color(&mut self, id: CoverId, color: Option<Color>) -> bool {
        match self.boxes.iter_mut().find(|b| b.id == id) {
            Some(cover) if cover.color != color => {
                cover.color = color;
                true
            }
            _ => false,
        }
    }

    /// Merge detection results requested at `anchor`.
    ///
    /// - A different anchor discards every existing box and adopts the anchor
    /// - Boxes of an `authoritative` category are replaced, even by an
    ///   empty result
    /// - Other categories (manual boxes in particular) are untouched
    pub fn merge_detected(
        &mut self,
        detected: Vec<DetectedBox>,
        anchor: Point,
        authoritative: &[CoverCategory],
        frame: &CoverFrame,
    ) -> MergeStats {
        let mut stats = MergeStats::default();

        if !same_point(anchor, self.origin) {
            stats.discarded = self.boxes.len();
            self.boxes.clear();
            self.origin = anchor;
        }

        let before = self.boxes.len();
        self.boxes.retain(|b| !authoritative.contains(&b.category));
        stats.replaced = before - self.boxes.len();

        let bounds = self.bounds(frame);
        let mut added_categories = BTreeSet::new();
        let mut foreign = 0usize;
        for detected in dedupe_boxes(detected) {
            if !detected.rect.intersects(&bounds) {
                continue;
            }
            let Some(category) = detected.resolved_category(authoritative) else {
                foreign += 1;
                continue;
            };
            let rect = detected.rect.clamp_within(&bounds, frame.min_size);
            self.insert(rect, category, None);
            added_categories.insert(category);
            stats.added += 1;
        }

        if foreign > 0 {
            debug!(foreign, "dropped detected boxes outside the family's categories");
        }

        self.filters.extend(added_categories);
        self.prune_filters();
        if stats.added > 0 {
            self.enabled = true;
        }

        info!(
            discarded = stats.discarded,
            replaced = stats.replaced,
            added = stats.added,
            "detection results merged"
        );
        stats
    }

    /// Capture the undoable fields, plus the caller's applied crop.
    pub fn snapshot(&self, applied_crop: Option<Rect>) -> UndoSnapshot {
        UndoSnapshot {
            boxes: self.boxes.clone(),
            origin: self.origin,
            filters: self.filters.clone(),
            enabled: self.enabled,
            color: self.color,
            applied_crop,
        }
    }

    /// Restore every cover field of a snapshot.
    ///
    /// Ids are never reused after a restore.
    pub fn restore(&mut self, snapshot: &UndoSnapshot) {
        self.boxes = snapshot.boxes.clone();
        self.origin = snapshot.origin;
        self.filters = snapshot.filters.clone();
        self.enabled = snapshot.enabled && !self.filters.is_empty();
        self.color = snapshot.color;
        let max_id = self.boxes.iter().map(|b| b.id.0).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1);
    }

    fn insert(&mut self, rect: Rect, category: CoverCategory, color: Option<Color>) -> CoverId {
        let id = CoverId(self.next_id);
        self.next_id += 1;
        self.boxes.push(CoverBox {
            id,
            rect,
            category,
            color,
        });
        id
    }

    fn present_categories(&self) -> BTreeSet<CoverCategory> {
        self.boxes.iter().map(|b| b.category).collect()
    }

    /// Drop filters for categories that no longer have boxes.
    fn prune_filters(&mut self) {
        let present = self.present_categories();
        self.filters.retain(|c| present.contains(c));
        if self.filters.is_empty() {
            self.enabled = false;
        }
    }
}

impl Default for CoverState {
    fn default() -> Self {
        Self::new(Color::BLACK)
    }
}

fn same_point(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < ORIGIN_EPSILON && (a.y - b.y).abs() < ORIGIN_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(crop: Option<Rect>) -> CoverFrame {
        CoverFrame {
            natural: Size::new(800, 600),
            applied_crop: crop,
            min_size: 1.0,
        }
    }

    fn detected(x: f64, y: f64, category: CoverCategory) -> DetectedBox {
        DetectedBox::new(Rect::new(x, y, 20.0, 10.0), Some(category))
    }

    const FACES: &[CoverCategory] = &[CoverCategory::Faces];

    #[test]
    fn test_add_manual_centered_in_image() {
        let mut covers = CoverState::default();
        let id = covers.add_manual(&frame(None), 0.25);
        let cover = covers.get(id).unwrap();
        assert_eq!(cover.rect, Rect::new(300.0, 225.0, 200.0, 150.0));
        assert_eq!(cover.category, CoverCategory::Manual);
        assert!(covers.is_enabled());
        assert_eq!(covers.active_filters(), vec![CoverCategory::Manual]);
    }

    #[test]
    fn test_add_manual_anchors_to_crop() {
        let crop = Rect::new(100.0, 100.0, 400.0, 300.0);
        let mut covers = CoverState::default();
        let id = covers.add_manual(&frame(Some(crop)), 0.25);
        assert_eq!(covers.origin(), Point::new(100.0, 100.0));
        let cover = covers.get(id).unwrap();
        assert_eq!(cover.rect, Rect::new(150.0, 112.5, 100.0, 75.0));
        assert_eq!(
            covers.absolute_rect(cover),
            Rect::new(250.0, 212.5, 100.0, 75.0)
        );
    }

    #[test]
    fn test_ids_are_unique() {
        let mut covers = CoverState::default();
        let a = covers.add_manual(&frame(None), 0.2);
        covers.remove(a);
        let b = covers.add_manual(&frame(None), 0.2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_prunes_filters() {
        let mut covers = CoverState::default();
        let id = covers.add_manual(&frame(None), 0.2);
        assert!(covers.remove(id));
        assert!(!covers.remove(id));
        assert!(covers.filters().is_empty());
        assert!(!covers.is_enabled());
    }

    #[test]
    fn test_update_rect_clamps_to_crop_bounds() {
        let crop = Rect::new(100.0, 100.0, 400.0, 300.0);
        let mut covers = CoverState::default();
        let id = covers.add_manual(&frame(Some(crop)), 0.2);
        assert!(covers.update_rect(id, Rect::new(380.0, -5.0, 50.0, 40.0), &frame(Some(crop))));
        assert_eq!(covers.get(id).unwrap().rect, Rect::new(350.0, 0.0, 50.0, 40.0));
        assert!(!covers.update_rect(CoverId(99), Rect::new(0.0, 0.0, 5.0, 5.0), &frame(None)));
    }

    #[test]
    fn test_bounds_without_matching_crop() {
        let mut covers = CoverState::default();
        covers.merge_detected(vec![], Point::new(10.0, 20.0), FACES, &frame(None));
        assert_eq!(covers.bounds(&frame(None)), Rect::new(-10.0, -20.0, 800.0, 600.0));
    }

    #[test]
    fn test_covers_reach_whole_image_after_crop_removed() {
        let crop = Rect::new(100.0, 100.0, 400.0, 300.0);
        let mut covers = CoverState::default();
        let id = covers.add_manual(&frame(Some(crop)), 0.2);
        assert_eq!(covers.origin(), Point::new(100.0, 100.0));

        // The crop is gone; the old origin stays but the full image is reachable
        let uncropped = frame(None);
        assert!(covers.update_rect(id, Rect::new(-100.0, -100.0, 50.0, 50.0), &uncropped));
        let cover = covers.get(id).unwrap();
        assert_eq!(covers.absolute_rect(cover), Rect::new(0.0, 0.0, 50.0, 50.0));

        assert!(covers.update_rect(id, Rect::new(-200.0, -200.0, 50.0, 50.0), &uncropped));
        let cover = covers.get(id).unwrap();
        assert_eq!(covers.absolute_rect(cover), Rect::new(0.0, 0.0, 50.0, 50.0));

        let second = covers.add_manual(&uncropped, 0.25);
        let cover = covers.get(second).unwrap();
        assert_eq!(covers.absolute_rect(cover).center(), Point::new(400.0, 300.0));
    }

    #[test]
    fn test_merge_drops_boxes_outside_family() {
        let f = frame(None);
        let text = &[CoverCategory::Date, CoverCategory::Emails];
        let mut covers = CoverState::default();
        let stats = covers.merge_detected(
            vec![
                detected(1.0, 1.0, CoverCategory::Date),
                detected(50.0, 1.0, CoverCategory::Faces),
                detected(100.0, 1.0, CoverCategory::Manual),
                DetectedBox::new(Rect::new(150.0, 1.0, 10.0, 10.0), None),
            ],
            Point::ORIGIN,
            text,
            &f,
        );
        assert_eq!(stats.added, 1);
        assert_eq!(covers.available_filters(), vec![CoverCategory::Date]);

        // Re-running the family replaces everything it produced
        let stats = covers.merge_detected(vec![], Point::ORIGIN, text, &f);
        assert_eq!(stats.replaced, 1);
        assert!(covers.boxes().is_empty());
    }

    #[test]
    fn test_replace_merge_keeps_manual() {
        let mut covers = CoverState::default();
        let f = frame(None);
        covers.merge_detected(vec![detected(10.0, 10.0, CoverCategory::Faces)], Point::ORIGIN, FACES, &f);
        covers.add_manual(&f, 0.2);

        let stats = covers.merge_detected(
            vec![detected(200.0, 200.0, CoverCategory::Faces)],
            Point::ORIGIN,
            FACES,
            &f,
        );
        assert_eq!(stats, MergeStats { discarded: 0, replaced: 1, added: 1 });

        let faces: Vec<_> = covers
            .boxes()
            .iter()
            .filter(|b| b.category == CoverCategory::Faces)
            .collect();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].rect.origin(), Point::new(200.0, 200.0));
        assert!(covers.boxes().iter().any(|b| b.category == CoverCategory::Manual));
    }

    #[test]
    fn test_reanchor_discards_everything() {
        let crop = Rect::new(10.0, 10.0, 300.0, 300.0);
        let mut covers = CoverState::default();
        covers.add_manual(&frame(Some(crop)), 0.2);
        covers.merge_detected(
            vec![detected(5.0, 5.0, CoverCategory::Date)],
            Point::new(10.0, 10.0),
            &[CoverCategory::Date],
            &frame(Some(crop)),
        );
        assert_eq!(covers.boxes().len(), 2);

        let stats = covers.merge_detected(
            vec![detected(1.0, 1.0, CoverCategory::Faces)],
            Point::ORIGIN,
            FACES,
            &frame(None),
        );
        assert_eq!(stats.discarded, 2);
        assert_eq!(covers.origin(), Point::ORIGIN);
        assert_eq!(covers.boxes().len(), 1);
        assert_eq!(covers.boxes()[0].category, CoverCategory::Faces);
        assert_eq!(covers.active_filters(), vec![CoverCategory::Faces]);
    }

    #[test]
    fn test_empty_result_clears_family() {
        let f = frame(None);
        let text = &[CoverCategory::Date, CoverCategory::Emails];
        let mut covers = CoverState::default();
        covers.merge_detected(
            vec![detected(1.0, 1.0, CoverCategory::Date), detected(50.0, 1.0, CoverCategory::Emails)],
            Point::ORIGIN,
            text,
            &f,
        );
        assert!(covers.is_enabled());

        let stats = covers.merge_detected(vec![], Point::ORIGIN, text, &f);
        assert_eq!(stats.replaced, 2);
        assert!(covers.boxes().is_empty());
        assert!(!covers.is_enabled());
    }

    #[test]
    fn test_merge_clamps_and_drops_outside() {
        let f = frame(None);
        let mut covers = CoverState::default();
        let stats = covers.merge_detected(
            vec![
                DetectedBox::new(Rect::new(790.0, 590.0, 50.0, 50.0), Some(CoverCategory::Faces)),
                DetectedBox::new(Rect::new(900.0, 10.0, 5.0, 5.0), Some(CoverCategory::Faces)),
            ],
            Point::ORIGIN,
            FACES,
            &f,
        );
        assert_eq!(stats.added, 1);
        assert_eq!(covers.boxes()[0].rect, Rect::new(750.0, 550.0, 50.0, 50.0));
    }

    #[test]
    fn test_filters_and_visibility() {
        let f = frame(None);
        let mut covers = CoverState::default();
        covers.merge_detected(
            vec![detected(1.0, 1.0, CoverCategory::Emails), detected(50.0, 1.0, CoverCategory::Date)],
            Point::ORIGIN,
            &[CoverCategory::Date, CoverCategory::Emails],
            &f,
        );
        covers.add_manual(&f, 0.2);
        assert_eq!(
            covers.available_filters(),
            vec![CoverCategory::Date, CoverCategory::Emails, CoverCategory::Manual]
        );

        covers.set_filters([CoverCategory::Manual, CoverCategory::Faces]);
        assert_eq!(covers.active_filters(), vec![CoverCategory::Manual]);
        assert_eq!(covers.visible_boxes().count(), 1);

        assert!(!covers.toggle_enabled());
        assert_eq!(covers.visible_boxes().count(), 0);
        assert_eq!(covers.boxes().len(), 3);

        covers.set_filters(Vec::<CoverCategory>::new());
        assert!(!covers.is_enabled());
        assert!(covers.toggle_enabled());
        assert_eq!(covers.visible_boxes().count(), 3);
    }

    #[test]
    fn test_toggle_without_boxes_stays_off() {
        let mut covers = CoverState::default();
        assert!(!covers.toggle_enabled());
    }

    #[test]
    fn test_colors() {
        let mut covers = CoverState::default();
        let id = covers.add_manual(&frame(None), 0.2);
        assert!(!covers.set_color(Color::BLACK));
        assert!(covers.set_color(Color::rgb(255, 0, 0)));
        assert!(covers.set_box_color(id, Some(Color::rgb(0, 0, 255))));
        assert!(!covers.set_box_color(id, Some(Color::rgb(0, 0, 255))));

        let paint = covers.paint_list();
        assert_eq!(paint[0].1, Color::rgb(0, 0, 255));
        covers.set_box_color(id, None);
        assert_eq!(covers.paint_list()[0].1, Color::rgb(255, 0, 0));
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let f = frame(None);
        let mut covers = CoverState::default();
        covers.add_manual(&f, 0.2);
        let snapshot = covers.snapshot(Some(Rect::new(1.0, 2.0, 3.0, 4.0)));

        covers.merge_detected(vec![detected(1.0, 1.0, CoverCategory::Faces)], Point::new(5.0, 5.0), FACES, &f);
        covers.set_color(Color::rgb(1, 1, 1));
        covers.restore(&snapshot);

        assert_eq!(covers.snapshot(Some(Rect::new(1.0, 2.0, 3.0, 4.0))), snapshot);
        let id = covers.add_manual(&f, 0.2);
        assert_eq!(covers.boxes().iter().filter(|b| b.id == id).count(), 1);
    }

    #[test]
    fn test_restore_rederives_enabled() {
        let mut covers = CoverState::default();
        let mut snapshot = covers.snapshot(None);
        snapshot.enabled = true;
        covers.restore(&snapshot);
        assert!(!covers.is_enabled());
    }
}
