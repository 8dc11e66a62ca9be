//! Editor configuration.
//!
//! Every field has a default, so hosts only pass the values they want to
//! override. Configuration is read once when an editing session is built.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cover::Color;

/// Errors that can occur while reading an editor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text is not valid JSON for this structure.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value outside its allowed range.
    #[error("Invalid value for {field}: {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
}

/// Tunables for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Fraction of the image covered by a freshly started crop (0.0 to 1.0]
    pub default_crop_fraction: f64,
    /// Size of a manual cover relative to the active bounds (0.0 to 1.0]
    pub manual_cover_fraction: f64,
    /// Maximum number of undo snapshots kept per image
    pub undo_depth: usize,
    /// Smallest width/height a rectangle may shrink to, in image pixels
    pub min_rect_size: f64,
    /// Lower bound for the viewport zoom factor
    pub min_zoom: f64,
    /// Upper bound for the viewport zoom factor
    pub max_zoom: f64,
    /// Multiplier applied by a single zoom-in/zoom-out step
    pub zoom_step: f64,
    /// Global cover color
    pub cover_color: Color,
    /// Appended to the source file stem to build the export file name
    pub export_suffix: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_crop_fraction: 0.5,
            manual_cover_fraction: 0.22,
            undo_depth: 50,
            min_rect_size: 1.0,
            min_zoom: 0.1,
            max_zoom: 8.0,
            zoom_step: 1.25,
            cover_color: Color::BLACK,
            export_suffix: "-edited".to_string(),
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON and validate it.
    ///
    /// Missing fields take their default values.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is inside its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value > 0.0 && value <= 1.0 {
                Ok(())
            } else {
                Err(ConfigError::OutOfRange {
                    field,
                    reason: "must be in (0, 1]",
                })
            }
        }

        fraction("default_crop_fraction", self.default_crop_fraction)?;
        fraction("manual_cover_fraction", self.manual_cover_fraction)?;

        if self.undo_depth == 0 {
            return Err(ConfigError::OutOfRange {
                field: "undo_depth",
                reason: "must be at least 1",
            });
        }
        if self.min_rect_size.is_nan() || self.min_rect_size < 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "min_rect_size",
                reason: "must be at least 1 pixel",
            });
        }
        if self.min_zoom.is_nan() || self.min_zoom <= 0.0 || self.min_zoom > self.max_zoom {
            return Err(ConfigError::OutOfRange {
                field: "min_zoom",
                reason: "must be positive and not above max_zoom",
            });
        }
        if self.zoom_step.is_nan() || self.zoom_step <= 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "zoom_step",
                reason: "must be greater than 1",
            });
        }
        Ok(())
    }
}
