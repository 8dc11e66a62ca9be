//! Cover (redaction) boxes.
//!
//! Cover boxes are stored relative to a cover origin rather than in
//! absolute image pixels. The origin is the top-left of the crop the
//! covers were created against, or `(0, 0)` without a crop. Detection
//! results arrive tagged with the origin they were requested for, and a
//! result for a different origin discards every existing box.
//!
//! Visibility is filter driven: a box is shown (and exported) only when
//! covers are enabled and its category is in the active filter set.

mod category;
mod collection;
mod color;

pub use category::CoverCategory;
pub use collection::{CoverBox, CoverFrame, CoverId, CoverState, MergeStats};
pub use color::{Color, ParseColorError};
