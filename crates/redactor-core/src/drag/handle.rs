//! Drag kinds and resize handles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the eight resize grips around a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    #[serde(rename = "n")]
    North,
    #[serde(rename = "s")]
    South,
    #[serde(rename = "e")]
    East,
    #[serde(rename = "w")]
    West,
    #[serde(rename = "ne")]
    NorthEast,
    #[serde(rename = "nw")]
    NorthWest,
    #[serde(rename = "se")]
    SouthEast,
    #[serde(rename = "sw")]
    SouthWest,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::North,
        Handle::South,
        Handle::East,
        Handle::West,
        Handle::NorthEast,
        Handle::NorthWest,
        Handle::SouthEast,
        Handle::SouthWest,
    ];

    pub const CORNERS: [Handle; 4] = [
        Handle::NorthEast,
        Handle::NorthWest,
        Handle::SouthEast,
        Handle::SouthWest,
    ];

    /// Corner handles move two edges at once.
    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Handle::NorthEast | Handle::NorthWest | Handle::SouthEast | Handle::SouthWest
        )
    }

    /// Which way each dragged edge faces: `-1` left/up, `1` right/down,
    /// `0` when the handle leaves that axis alone.
    pub fn direction(self) -> (i8, i8) {
        match self {
            Handle::North => (0, -1),
            Handle::South => (0, 1),
            Handle::East => (1, 0),
            Handle::West => (-1, 0),
            Handle::NorthEast => (1, -1),
            Handle::NorthWest => (-1, -1),
            Handle::SouthEast => (1, 1),
            Handle::SouthWest => (-1, 1),
        }
    }

    /// Short compass name, as used by hosts to label grips.
    pub fn as_str(self) -> &'static str {
        match self {
            Handle::North => "n",
            Handle::South => "s",
            Handle::East => "e",
            Handle::West => "w",
            Handle::NorthEast => "ne",
            Handle::NorthWest => "nw",
            Handle::SouthEast => "se",
            Handle::SouthWest => "sw",
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Handle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Handle::ALL
            .into_iter()
            .find(|h| h.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown handle: {s}"))
    }
}

/// How a rectangle is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragKind {
    /// Translate the whole rectangle
    Move,
    /// Resize by one of the eight handles
    Resize(Handle),
}
