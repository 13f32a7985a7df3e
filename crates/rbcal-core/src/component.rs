//! Output components and excitation bands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One orthogonal output component of a three-component sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// North (or "1") horizontal.
    North,
    /// East (or "2") horizontal.
    East,
    /// Vertical.
    Vertical,
}

impl Component {
    /// All components in storage order.
    pub const ALL: [Component; 3] = [Component::North, Component::East, Component::Vertical];

    /// Position in `[north, east, vertical]` arrays.
    pub fn index(self) -> usize {
        match self {
            Component::North => 0,
            Component::East => 1,
            Component::Vertical => 2,
        }
    }

    /// Lowercase name, also used for report file names.
    pub fn name(self) -> &'static str {
        match self {
            Component::North => "north",
            Component::East => "east",
            Component::Vertical => "vertical",
        }
    }

    /// Orientation letter used in SEED channel codes.
    pub fn orientation(self) -> char {
        match self {
            Component::North => 'N',
            Component::East => 'E',
            Component::Vertical => 'Z',
        }
    }

    /// Classify a channel code by its orientation character.
    ///
    /// Triaxial sensors recorded in UVW mode put U on the vertical slot,
    /// V on the north slot and W on the east slot.
    pub fn from_channel_code(code: &str) -> Option<Component> {
        match code.chars().last()?.to_ascii_uppercase() {
            'Z' | 'U' => Some(Component::Vertical),
            'N' | '1' | 'V' => Some(Component::North),
            'E' | '2' | 'W' => Some(Component::East),
            _ => None,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Excitation band of a calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// Long-period random-binary run.
    Low,
    /// Short-period random-binary run.
    High,
}

impl Band {
    /// Short label for logs and file names.
    pub fn label(self) -> &'static str {
        match self {
            Band::Low => "lf",
            Band::High => "hf",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
