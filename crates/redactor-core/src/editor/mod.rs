//! The editing session the host talks to.
//!
//! [`Editor`] is built once per session and owns everything the host
//! does not: the per-image crop and cover state, undo history, viewport
//! and the single active gesture. The host forwards pointer and keyboard
//! input, reads [`EditorGeometry`] back, and drains [`EditorEvent`]s to
//! keep its UI in sync.
//!
//! # Per-image State
//!
//! State is kept in a map keyed by [`ImageId`] and looked up on every
//! access. Loading a different image drops every other entry, so nothing
//! leaks from one image to the next.

mod gesture;
mod types;

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info, warn};

use crate::composite::{export, ExportResult};
use crate::config::{ConfigError, EditorConfig};
use crate::cover::{Color, CoverCategory, CoverFrame, CoverId, CoverState, MergeStats};
use crate::crop::{CropPhase, CropState};
use crate::decode::DecodeError;
use crate::detect::{DetectedBox, DetectionBatch, DetectionFamily, DetectionRequest, FaceDetectionParams};
use crate::geometry::{Point, Rect};
use crate::metrics::{compute_metrics, point_to_image_space, rect_to_display, ContainerBounds, Metrics, MetricsCache};
use crate::source::{ImageId, SourceImage};
use crate::undo::{UndoSnapshot, UndoStack};
use crate::viewport::Viewport;

use gesture::ActiveGesture;
pub use types::{
    CoverView, EditorEvent, EditorGeometry, EditorKey, GestureTarget, MergeOutcome, PointerInput,
};

/// Editing state owned for one source image.
#[derive(Debug)]
struct ImageState {
    crop: CropState,
    covers: CoverState,
    undo: UndoStack<UndoSnapshot>,
}

impl ImageState {
    fn new(config: &EditorConfig) -> Self {
        Self {
            crop: CropState::new(),
            covers: CoverState::new(config.cover_color),
            undo: UndoStack::new(config.undo_depth),
        }
    }

    /// Snapshot the pre-mutation state, honoring an open batch.
    fn record_undo(&mut self) -> bool {
        let Self { crop, covers, undo } = self;
        undo.record(|| covers.snapshot(crop.applied()))
    }
}

/// Borrowed view of the loaded image and its state.
struct Current<'a> {
    source: &'a SourceImage,
    state: &'a mut ImageState,
    config: &'a EditorConfig,
}

impl Current<'_> {
    fn frame(&self) -> CoverFrame {
        CoverFrame {
            natural: self.source.size(),
            applied_crop: self.state.crop.applied(),
            min_size: self.config.min_rect_size,
        }
    }
}

/// An interactive crop and cover editing session.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    source: Option<SourceImage>,
    states: HashMap<ImageId, ImageState>,
    viewport: Viewport,
    container: Option<ContainerBounds>,
    metrics: MetricsCache,
    gesture: Option<ActiveGesture>,
    events: Vec<EditorEvent>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// Create a session. The configuration is trusted; use
    /// [`Editor::with_config`] for host-supplied values.
    pub fn new(config: EditorConfig) -> Self {
        let viewport = Viewport::new(config.min_zoom, config.max_zoom);
        Self {
            config,
            source: None,
            states: HashMap::new(),
            viewport,
            container: None,
            metrics: MetricsCache::new(),
            gesture: None,
            events: Vec::new(),
        }
    }

    /// Validate `config` and create a session.
    pub fn with_config(config: EditorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Source
    // ------------------------------------------------------------------

    /// Load a decoded source image.
    ///
    /// The same id keeps its editing state; a different id starts fresh
    /// and drops the state of every other image.
    pub fn set_source(&mut self, source: SourceImage) {
        self.end_gesture();
        let id = source.id.clone();
        let same_image = self.source.as_ref().is_some_and(|s| s.id == id);

        if !same_image {
            self.states.retain(|key, _| *key == id);
            self.viewport.reset();
            info!(image = %id, width = source.pixels.width(), height = source.pixels.height(), "source image changed");
        }
        let config = &self.config;
        self.states
            .entry(id.clone())
            .or_insert_with(|| ImageState::new(config));
        self.source = Some(source);
        self.refresh_metrics();

        if !same_image {
            self.events.push(EditorEvent::SourceChanged { image_id: Some(id) });
        }
    }

    /// Decode bytes and load them as the source image.
    pub fn load_source(
        &mut self,
        id: ImageId,
        file_name: Option<String>,
        bytes: &[u8],
    ) -> Result<(), DecodeError> {
        let source = SourceImage::decode(id, file_name, bytes)?;
        self.set_source(source);
        Ok(())
    }

    /// Unload the source image and discard all editing state.
    pub fn clear_source(&mut self) {
        self.end_gesture();
        if self.source.take().is_some() {
            self.states.clear();
            self.viewport.reset();
            self.refresh_metrics();
            info!("source image cleared");
            self.events.push(EditorEvent::SourceChanged { image_id: None });
        }
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    fn current(&mut self) -> Option<Current<'_>> {
        let source = self.source.as_ref()?;
        let config = &self.config;
        let state = self
            .states
            .entry(source.id.clone())
            .or_insert_with(|| ImageState::new(config));
        Some(Current {
            source,
            state,
            config,
        })
    }

    fn state(&self) -> Option<&ImageState> {
        self.source.as_ref().and_then(|s| self.states.get(&s.id))
    }

    // ------------------------------------------------------------------
    // Layout and viewport
    // ------------------------------------------------------------------

    /// Report the container's bounding box in client pixels.
    pub fn set_container(&mut self, container: ContainerBounds) {
        self.container = Some(container);
        self.refresh_metrics();
    }

    /// Current display metrics; `None` until an image is loaded into a
    /// container with area.
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.get()
    }

    /// Advances only when the metrics actually change.
    pub fn metrics_revision(&self) -> u64 {
        self.metrics.revision()
    }

    /// Map a pointer position to image pixels.
    pub fn point_to_image(&self, client: Point) -> Option<Point> {
        self.metrics.get().map(|m| point_to_image_space(client, m))
    }

    /// Map an image rectangle to container pixels.
    pub fn display_rect(&self, rect: &Rect) -> Option<Rect> {
        self.metrics.get().map(|m| rect_to_display(rect, m))
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_by(self.config.zoom_step);
        self.refresh_metrics();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_by(1.0 / self.config.zoom_step);
        self.refresh_metrics();
    }

    /// Zoom by `factor`, keeping the image pixel under `client` in place.
    pub fn zoom_at(&mut self, factor: f64, client: Point) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        match self.metrics.get().copied() {
            Some(metrics) => self.viewport.zoom_around(factor, client, &metrics),
            None => self.viewport.zoom_by(factor),
        }
        self.refresh_metrics();
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.viewport.pan_by(dx, dy);
        self.refresh_metrics();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.refresh_metrics();
    }

    fn refresh_metrics(&mut self) {
        let next = match (&self.container, &self.source) {
            (Some(container), Some(source)) => compute_metrics(
                container,
                source.size(),
                self.viewport.scale(),
                self.viewport.offset(),
            ),
            _ => None,
        };
        if self.metrics.update(next) {
            debug!(revision = self.metrics.revision(), "metrics changed");
        }
    }

    // ------------------------------------------------------------------
    // Crop
    // ------------------------------------------------------------------

    pub fn crop_phase(&self) -> CropPhase {
        self.state().map(|s| s.crop.phase()).unwrap_or_default()
    }

    pub fn draft_rect(&self) -> Option<Rect> {
        self.state().and_then(|s| s.crop.draft())
    }

    pub fn applied_rect(&self) -> Option<Rect> {
        self.state().and_then(|s| s.crop.applied())
    }

    /// Begin a crop selection. No-op without a source or while selecting.
    pub fn start_crop(&mut self) -> bool {
        let Some(cur) = self.current() else {
            return false;
        };
        if cur.state.crop.is_selecting() {
            return false;
        }
        cur.state
            .crop
            .start(cur.source.size(), cur.config.default_crop_fraction);
        self.events.push(EditorEvent::CropPhaseChanged {
            phase: CropPhase::Selecting,
        });
        true
    }

    /// Commit the draft as the applied crop, ending any active gesture.
    ///
    /// Returns false when idle or when there is no draft to commit.
    pub fn finish_crop(&mut self) -> bool {
        self.end_gesture();
        let Some(cur) = self.current() else {
            return false;
        };
        if !cur.state.crop.is_selecting() {
            return false;
        }
        if cur.state.crop.draft().is_some() {
            cur.state.record_undo();
        }
        let committed = cur.state.crop.finish();
        let applied = cur.state.crop.applied();

        self.events.push(EditorEvent::CropPhaseChanged {
            phase: CropPhase::Idle,
        });
        if committed {
            info!(?applied, "crop applied");
            self.events.push(EditorEvent::CropCommitted { applied });
        }
        committed
    }

    /// Finish when selecting, start otherwise. Returns the new phase.
    pub fn toggle_crop(&mut self) -> CropPhase {
        if self.crop_phase() == CropPhase::Selecting {
            self.finish_crop();
        } else {
            self.start_crop();
        }
        self.crop_phase()
    }

    /// Leave the selection without touching the applied crop.
    pub fn cancel_crop(&mut self) -> bool {
        self.end_crop_gesture();
        let Some(cur) = self.current() else {
            return false;
        };
        if !cur.state.crop.cancel() {
            return false;
        }
        self.events.push(EditorEvent::CropPhaseChanged {
            phase: CropPhase::Idle,
        });
        true
    }

    /// Set the applied crop directly, bypassing the selection.
    ///
    /// The rectangle is clamped to the image. Any selection in progress and
    /// any active gesture are dropped. Recorded for undo.
    pub fn set_applied_crop_rect(&mut self, rect: Option<Rect>) -> bool {
        self.end_gesture();
        let Some(cur) = self.current() else {
            return false;
        };
        let natural = cur.source.size().to_rect();
        let min = cur.config.min_rect_size;
        let rect = match rect {
            Some(r) if !r.is_finite() => return false,
            Some(r) => Some(r.clamp_within(&natural, min)),
            None => None,
        };
        let was_selecting = cur.state.crop.is_selecting();
        cur.state.record_undo();
        cur.state.crop.set_applied(rect);

        if was_selecting {
            self.events.push(EditorEvent::CropPhaseChanged {
                phase: CropPhase::Idle,
            });
        }
        self.events
            .push(EditorEvent::CropCommitted { applied: rect });
        true
    }

    // ------------------------------------------------------------------
    // Covers
    // ------------------------------------------------------------------

    pub fn covers(&self) -> Option<&CoverState> {
        self.state().map(|s| &s.covers)
    }

    /// Apply an undoable cover mutation and queue `CoversChanged` when it
    /// reports a change.
    ///
    /// `precheck` decides whether the mutation would do anything, so
    /// no-ops never leave an empty undo step behind. An active cover drag
    /// is ended first so the drag and this mutation stay separate steps.
    fn mutate_covers<T>(
        &mut self,
        precheck: impl FnOnce(&CoverState, &CoverFrame) -> bool,
        mutate: impl FnOnce(&mut CoverState, &CoverFrame) -> T,
    ) -> Option<T> {
        let cur = self.current()?;
        if !precheck(&cur.state.covers, &cur.frame()) {
            return None;
        }
        if self.gesture.is_some_and(|g| matches!(g.target, GestureTarget::Cover(_))) {
            self.end_gesture();
        }
        let cur = self.current()?;
        let frame = cur.frame();
        cur.state.record_undo();
        let result = mutate(&mut cur.state.covers, &frame);
        self.events.push(EditorEvent::CoversChanged);
        Some(result)
    }

    /// Add a centered manual cover.
    pub fn add_manual_cover(&mut self) -> Option<CoverId> {
        let fraction = self.config.manual_cover_fraction;
        self.mutate_covers(|_, _| true, |covers, frame| covers.add_manual(frame, fraction))
    }

    pub fn remove_cover(&mut self, id: CoverId) -> bool {
        self.mutate_covers(|c, _| c.get(id).is_some(), |covers, _| covers.remove(id))
            .unwrap_or(false)
    }

    /// Replace a cover's rectangle (cover space), clamped to its bounds.
    pub fn update_cover_rect(&mut self, id: CoverId, rect: Rect) -> bool {
        self.mutate_covers(
            |c, frame| {
                let clamped = rect.clamp_within(&c.bounds(frame), frame.min_size);
                rect.is_finite() && c.get(id).is_some_and(|b| b.rect != clamped)
            },
            |covers, frame| covers.update_rect(id, rect, frame),
        )
        .unwrap_or(false)
    }

    /// Set the active filter categories.
    pub fn set_filters(&mut self, filters: impl IntoIterator<Item = CoverCategory>) {
        let filters: Vec<_> = filters.into_iter().collect();
        self.mutate_covers(
            |c, _| {
                let present = c.available_filters();
                let next: BTreeSet<_> = filters
                    .iter()
                    .copied()
                    .filter(|f| present.contains(f))
                    .collect();
                next != *c.filters() || c.is_enabled() == next.is_empty()
            },
            |covers, _| covers.set_filters(filters.iter().copied()),
        );
    }

    /// Set the active filters by label (`"IBAN"`, `"Phone-numbers"`, ...).
    /// Unknown labels are ignored.
    pub fn set_filter_labels<S: AsRef<str>>(&mut self, labels: impl IntoIterator<Item = S>) {
        let filters: Vec<_> = labels
            .into_iter()
            .filter_map(|label| CoverCategory::from_label(label.as_ref()))
            .collect();
        self.set_filters(filters);
    }

    pub fn available_filters(&self) -> Vec<CoverCategory> {
        self.covers()
            .map(CoverState::available_filters)
            .unwrap_or_default()
    }

    pub fn active_filters(&self) -> Vec<CoverCategory> {
        self.covers()
            .map(CoverState::active_filters)
            .unwrap_or_default()
    }

    /// Show or hide all covers. Returns the new enabled flag.
    pub fn toggle_covers(&mut self) -> bool {
        self.mutate_covers(
            |c, _| c.is_enabled() || !c.boxes().is_empty(),
            |covers, _| covers.toggle_enabled(),
        )
        .unwrap_or(false)
    }

    /// Change the global cover color.
    pub fn set_color(&mut self, color: Color) -> bool {
        self.mutate_covers(|c, _| c.color() != color, |covers, _| covers.set_color(color))
            .unwrap_or(false)
    }

    /// Set or clear one cover's color override.
    pub fn set_cover_override_color(&mut self, id: CoverId, color: Option<Color>) -> bool {
        self.mutate_covers(
            |c, _| c.get(id).is_some_and(|b| b.color != color),
            |covers, _| covers.set_box_color(id, color),
        )
        .unwrap_or(false)
    }

    /// Merge detected boxes requested at `anchor`.
    pub fn merge_detected_boxes(
        &mut self,
        boxes: Vec<DetectedBox>,
        anchor: Point,
        authoritative: &[CoverCategory],
    ) -> Option<MergeStats> {
        if !anchor.is_finite() {
            return None;
        }
        self.mutate_covers(
            |_, _| true,
            |covers, frame| covers.merge_detected(boxes, anchor, authoritative, frame),
        )
    }

    /// Merge a detection batch after checking it is for the loaded image.
    pub fn merge_detection(&mut self, batch: DetectionBatch) -> MergeOutcome {
        let Some(source) = &self.source else {
            return MergeOutcome::NoSource;
        };
        if source.id != batch.image_id {
            warn!(
                batch = %batch.image_id,
                current = %source.id,
                family = %batch.family,
                "discarding stale detection result"
            );
            return MergeOutcome::Stale;
        }
        if !batch.anchor.is_finite() {
            warn!(anchor = ?batch.anchor, family = %batch.family, "detection anchor is not finite");
            return MergeOutcome::InvalidAnchor;
        }
        match self.merge_detected_boxes(
            batch.boxes,
            batch.anchor,
            batch.family.authoritative_categories(),
        ) {
            Some(stats) => MergeOutcome::Merged(stats),
            None => MergeOutcome::NoSource,
        }
    }

    // ------------------------------------------------------------------
    // Detection and export
    // ------------------------------------------------------------------

    /// The cover origin a detection issued now must be merged against.
    pub fn detection_anchor(&self) -> Option<Point> {
        self.source.as_ref()?;
        Some(
            self.applied_rect()
                .map(|r| r.origin())
                .unwrap_or(Point::ORIGIN),
        )
    }

    /// PNG of the crop-applied image without covers, as sent to detection.
    pub fn detection_image(&self) -> Option<ExportResult> {
        let source = self.source.as_ref()?;
        export(source, self.applied_rect(), &[], &self.config.export_suffix)
            .map_err(|e| warn!(error = %e, "detection image export failed"))
            .ok()
    }

    /// Everything the host needs to run a detection of `family`.
    pub fn detection_request(&self, family: DetectionFamily) -> Option<DetectionRequest> {
        let anchor = self.detection_anchor()?;
        let image = self.detection_image()?;
        let source = self.source.as_ref()?;
        Some(DetectionRequest {
            image_id: source.id.clone(),
            family,
            anchor,
            image_png: image.bytes,
            file_name: image.file_name,
            face_params: FaceDetectionParams::default(),
        })
    }

    /// Encode the applied crop with visible covers painted on.
    ///
    /// Failures are logged and yield `None`; editor state is untouched.
    pub fn get_cropped_export(&self) -> Option<ExportResult> {
        let source = self.source.as_ref()?;
        let state = self.state()?;
        let covers = state.covers.paint_list();
        export(
            source,
            state.crop.applied(),
            &covers,
            &self.config.export_suffix,
        )
        .map_err(|e| warn!(image = %source.id, error = %e, "export failed"))
        .ok()
    }

    // ------------------------------------------------------------------
    // Undo and keyboard
    // ------------------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.state().is_some_and(|s| s.undo.can_undo())
    }

    /// Restore the state before the last undoable mutation.
    pub fn undo(&mut self) -> bool {
        self.end_gesture();
        let Some(cur) = self.current() else {
            return false;
        };
        let Some(snapshot) = cur.state.undo.pop() else {
            return false;
        };
        let was_selecting = cur.state.crop.is_selecting();
        cur.state.covers.restore(&snapshot);
        cur.state.crop.set_applied(snapshot.applied_crop);
        info!(
            boxes = snapshot.boxes.len(),
            applied = ?snapshot.applied_crop,
            "undo restored snapshot"
        );

        if was_selecting {
            self.events.push(EditorEvent::CropPhaseChanged {
                phase: CropPhase::Idle,
            });
        }
        self.events.push(EditorEvent::CropCommitted {
            applied: snapshot.applied_crop,
        });
        self.events.push(EditorEvent::CoversChanged);
        true
    }

    /// Handle a key press. Returns true when the key was used.
    pub fn key_down(&mut self, key: EditorKey) -> bool {
        match key {
            EditorKey::Enter => {
                if self.crop_phase() != CropPhase::Selecting {
                    return false;
                }
                self.finish_crop();
                true
            }
            EditorKey::Escape => self.cancel_gesture() || self.cancel_crop(),
            EditorKey::Undo => self.undo(),
        }
    }

    /// Drain queued notifications.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Everything the host needs to draw the overlay.
    pub fn geometry(&self) -> EditorGeometry {
        let state = self.state();
        let covers = state.map(|s| &s.covers);
        let views = covers
            .map(|c| {
                c.boxes()
                    .iter()
                    .map(|b| {
                        let absolute = c.absolute_rect(b);
                        CoverView {
                            cover: b.clone(),
                            absolute,
                            display: self.display_rect(&absolute),
                            visible: c.is_visible(b),
                            paint_color: c.effective_color(b),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        let draft = self.draft_rect();

        EditorGeometry {
            image_id: self.source.as_ref().map(|s| s.id.clone()),
            natural: self.source.as_ref().map(SourceImage::size),
            phase: self.crop_phase(),
            draft_rect: draft,
            draft_display: draft.and_then(|r| self.display_rect(&r)),
            applied_rect: self.applied_rect(),
            cover_origin: covers.map(CoverState::origin).unwrap_or(Point::ORIGIN),
            covers: views,
            available_filters: self.available_filters(),
            active_filters: self.active_filters(),
            covers_enabled: covers.is_some_and(CoverState::is_enabled),
            cover_color: covers
                .map(CoverState::color)
                .unwrap_or(self.config.cover_color),
            can_undo: self.can_undo(),
        }
    }
}
