//! Bounded undo history.
//!
//! Snapshots are taken *before* a mutation. Restoring pops the newest one;
//! when the stack is full the oldest is evicted.
//!
//! A continuous gesture is bracketed by [`UndoStack::begin_batch`] and
//! [`UndoStack::end_batch`]: only the first record inside the bracket is
//! kept, so one drag is one undo step no matter how many moves it has.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cover::{Color, CoverBox, CoverCategory};
use crate::geometry::{Point, Rect};

/// Everything an undo step restores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoSnapshot {
    pub boxes: Vec<CoverBox>,
    pub origin: Point,
    pub filters: BTreeSet<CoverCategory>,
    pub enabled: bool,
    pub color: Color,
    pub applied_crop: Option<Rect>,
}

/// LIFO history with FIFO eviction at `depth`.
#[derive(Debug, Clone)]
pub struct UndoStack<T> {
    entries: VecDeque<T>,
    depth: usize,
    batch: BatchState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchState {
    Closed,
    Open { recorded: bool },
}

impl<T> UndoStack<T> {
    /// Create an empty stack keeping at most `depth` entries (at least one).
    pub fn new(depth: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            depth: depth.max(1),
            batch: BatchState::Closed,
        }
    }

    /// Push a snapshot, evicting the oldest when full.
    pub fn push(&mut self, snapshot: T) {
        if self.entries.len() == self.depth {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Record a pre-mutation snapshot, honoring an open batch.
    ///
    /// The closure only runs when the snapshot is actually kept. Returns
    /// true when something was pushed.
    pub fn record(&mut self, snapshot: impl FnOnce() -> T) -> bool {
        match self.batch {
            BatchState::Open { recorded: true } => false,
            BatchState::Open { recorded: false } => {
                self.push(snapshot());
                self.batch = BatchState::Open { recorded: true };
                true
            }
            BatchState::Closed => {
                self.push(snapshot());
                true
            }
        }
    }

    /// Open a batch. A batch that is already open is left as is.
    pub fn begin_batch(&mut self) {
        if self.batch == BatchState::Closed {
            self.batch = BatchState::Open { recorded: false };
        }
    }

    pub fn end_batch(&mut self) {
        self.batch = BatchState::Closed;
    }

    pub fn is_batching(&self) -> bool {
        self.batch != BatchState::Closed
    }

    /// Pop the newest snapshot; `None` on an empty stack.
    pub fn pop(&mut self) -> Option<T> {
        let snapshot = self.entries.pop_back();
        if snapshot.is_some() {
            debug!(remaining = self.entries.len(), "undo snapshot popped");
        }
        snapshot
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.batch = BatchState::Closed;
    }
}
