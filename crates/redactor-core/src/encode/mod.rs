//! Export encoding.
//!
//! Exports are always PNG: lossless and alpha-capable, so painted covers
//! stay exactly the color they were painted with.

mod png;

pub use png::{encode_png, encode_png_raw, EncodeError};
