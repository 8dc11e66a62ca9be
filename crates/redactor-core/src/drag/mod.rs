//! Rectangle drag engine.
//!
//! Stateless math shared by crop and cover editing: given how a rectangle
//! is being dragged, where the drag started, and where the pointer is now,
//! compute the next rectangle.
//!
//! # Failure Policy
//!
//! Drag math runs on every pointer move and must never fail mid-gesture.
//! Missing or non-finite inputs yield `None`, meaning "no change": the
//! caller keeps its previous rectangle and ignores the event.
//!
//! # Invariants
//!
//! Every rectangle returned here lies inside the supplied bounds and is at
//! least `min_size` wide and tall. Dragging a handle past the opposite
//! edge mirrors the rectangle instead of producing a negative size.

mod handle;
mod resize;
mod session;

pub use handle::{DragKind, Handle};
pub use resize::{calculate_handle_rect, calculate_move_rect};
pub use session::DragSession;
