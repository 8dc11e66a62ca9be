//! Crop session state machine.
//!
//! ```text
//!          start()               finish() / cancel()
//!   Idle ───────────▶ Selecting ─────────────────────▶ Idle
//! ```
//!
//! While `Selecting`, drags edit the draft rectangle only. Finishing copies
//! the draft into the applied rectangle, which is what exports clip to.
//! An applied rectangle of `None` means "the whole image".

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{Rect, Size};

/// Whether a crop selection is in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropPhase {
    #[default]
    Idle,
    Selecting,
}

/// Result of [`CropState::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropToggle {
    /// A selection was started
    Started,
    /// The selection was committed as the applied crop
    Committed,
    /// The selection ended without a draft to commit
    Abandoned,
}

/// Crop state for one source image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CropState {
    phase: CropPhase,
    draft: Option<Rect>,
    applied: Option<Rect>,
}

impl CropState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CropPhase {
        self.phase
    }

    pub fn is_selecting(&self) -> bool {
        self.phase == CropPhase::Selecting
    }

    /// The in-progress rectangle; only present while selecting.
    pub fn draft(&self) -> Option<Rect> {
        self.draft
    }

    /// The last committed crop; `None` means the full image.
    pub fn applied(&self) -> Option<Rect> {
        self.applied
    }

    /// Begin a selection.
    ///
    /// The draft is seeded from the applied crop when there is one, else a
    /// centered rectangle covering `default_fraction` of each dimension.
    /// Calling this while already selecting keeps the current draft.
    pub fn start(&mut self, natural: Size, default_fraction: f64) {
        if self.is_selecting() {
            return;
        }
        let bounds = natural.to_rect();
        let seed = self
            .applied
            .unwrap_or_else(|| Rect::centered_in(&bounds, default_fraction));
        self.draft = Some(seed);
        self.phase = CropPhase::Selecting;
        debug!(?seed, "crop selection started");
    }

    /// Replace the draft while selecting. Ignored when idle.
    pub fn set_draft(&mut self, rect: Rect) {
        if self.is_selecting() {
            self.draft = Some(rect);
        }
    }

    /// Commit the draft.
    ///
    /// Returns true when a draft was copied into the applied crop. A
    /// selection without a draft ends without touching the applied crop;
    /// an idle state is left alone. Both return false.
    pub fn finish(&mut self) -> bool {
        if !self.is_selecting() {
            return false;
        }
        self.phase = CropPhase::Idle;
        match self.draft.take() {
            Some(rect) => {
                self.applied = Some(rect);
                debug!(?rect, "crop committed");
                true
            }
            None => false,
        }
    }

    /// Leave the selection, discarding the draft.
    pub fn cancel(&mut self) -> bool {
        if !self.is_selecting() {
            return false;
        }
        self.phase = CropPhase::Idle;
        self.draft = None;
        debug!("crop selection cancelled");
        true
    }

    /// Finish when selecting, start otherwise.
    pub fn toggle(&mut self, natural: Size, default_fraction: f64) -> CropToggle {
        if self.is_selecting() {
            if self.finish() {
                CropToggle::Committed
            } else {
                CropToggle::Abandoned
            }
        } else {
            self.start(natural, default_fraction);
            CropToggle::Started
        }
    }

    /// Force the applied crop, bypassing the state machine.
    ///
    /// Used for restores: the phase drops to `Idle` and any draft is lost.
    pub fn set_applied(&mut self, rect: Option<Rect>) {
        self.phase = CropPhase::Idle;
        self.draft = None;
        self.applied = rect;
    }

    /// The region exports clip to: the applied crop or the full image.
    pub fn export_region(&self, natural: Size) -> Rect {
        self.applied.unwrap_or_else(|| natural.to_rect())
    }
}
