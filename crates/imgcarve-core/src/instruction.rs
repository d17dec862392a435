//! Tool-motion instructions
//!
//! The compiled program is an append-only list of [`Instruction`]s in
//! machine units. Depths are negative below the stock surface.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single motion or state directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Rapid positioning at safe height
    RapidMove { x: f64, y: f64 },
    /// Linear cutting move
    FeedMove { x: f64, y: f64, z: f64 },
    /// Change the active cutting depth without horizontal motion
    SetDepth { z: f64 },
    /// Retract to safe height
    ToolUp,
    /// Plunge to the active depth
    ToolDown,
    /// Non-executable annotation
    Comment(String),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RapidMove { x, y } => write!(f, "RapidMove({:.3}, {:.3})", x, y),
            Self::FeedMove { x, y, z } => write!(f, "FeedMove({:.3}, {:.3}, {:.3})", x, y, z),
            Self::SetDepth { z } => write!(f, "SetDepth({:.3})", z),
            Self::ToolUp => write!(f, "ToolUp"),
            Self::ToolDown => write!(f, "ToolDown"),
            Self::Comment(text) => write!(f, "Comment({})", text),
        }
    }
}

/// Tool position and spindle engagement tracked while compiling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolState {
    /// X position in machine units
    pub x: f64,
    /// Y position in machine units
    pub y: f64,
    /// Z position in machine units
    pub z: f64,
    /// Active cutting depth that `ToolDown` plunges to
    pub active_depth: f64,
    /// Whether the tool is below safe height
    pub tool_down: bool,
}

impl ToolState {
    /// Tool parked at the origin at the given safe height
    pub fn parked(safe_height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: safe_height,
            active_depth: 0.0,
            tool_down: false,
        }
    }
}

impl Default for ToolState {
    fn default() -> Self {
        Self::parked(0.0)
    }
}
