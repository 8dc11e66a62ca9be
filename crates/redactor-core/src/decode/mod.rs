//! Source image decoding.
//!
//! Accepts JPEG and PNG bytes and produces RGBA pixels with the EXIF
//! orientation already applied, so every downstream coordinate is in the
//! orientation the user sees.
//!
//! # Examples
//!
//! ```ignore
//! use redactor_core::decode::decode_image;
//!
//! let bytes = std::fs::read("scan.jpg").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width(), image.height());
//! ```

mod raster;
mod types;

pub use raster::{decode_image, get_orientation};
pub use types::{DecodeError, Orientation};
