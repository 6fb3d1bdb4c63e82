//! Validated build parameters.
//!
//! Every value here has already passed the configuration boundary
//! ([`crate::config`]); the geometry stages take them at face value.

use crate::error::ConfigError;
use crate::profile::{BASE_HEIGHT, FLOOR_THICKNESS, HEIGHT_UNIT, LIP_HEIGHT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How [`HeightSpec::value`] is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeightMode {
    /// Count of 7 mm height increments, measured from the bottom to the body top.
    Units,
    /// Usable cavity depth above the floor, in millimeters.
    Internal,
    /// Total external height including the stacking lip, in millimeters.
    External,
}

/// Requested height plus its interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightSpec {
    /// Raw value.
    pub value: f64,
    /// Interpretation.
    pub mode: HeightMode,
}

impl HeightSpec {
    /// Height units.
    pub fn units(n: f64) -> Self {
        Self {
            value: n,
            mode: HeightMode::Units,
        }
    }

    /// Body height: z of the top of the wall, where the lip begins.
    pub fn body_height(&self) -> f64 {
        match self.mode {
            HeightMode::Units => self.value * HEIGHT_UNIT,
            HeightMode::Internal => self.value + BASE_HEIGHT + FLOOR_THICKNESS,
            HeightMode::External => self.value - LIP_HEIGHT,
        }
    }
}

/// Finger-grip slots cut into the bin rim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GripMode {
    /// No slots.
    #[default]
    None,
    /// Slots on the two faces normal to Y.
    Single,
    /// Slots on all four faces.
    Full,
}

/// Interior floor treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteriorStyle {
    /// Pockets run down to the floor.
    #[default]
    Minimal,
    /// A raised plateau; pockets are cut from half the cavity height.
    PartialRaised,
}

/// Output selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Part {
    /// Bin only.
    #[default]
    Bin,
    /// Lid only, flipped onto its own origin for printing.
    Lid,
    /// Lid seated on the bin.
    BothClosed,
    /// Bin and lid side by side for preview.
    BothOpen,
    /// A thin horizontal band of the bin around the lip, for fit tests.
    Slice,
}

/// A complete, validated parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildParameters {
    /// Footprint width in grid cells (>= 1).
    pub grid_x: u32,
    /// Footprint depth in grid cells (>= 1).
    pub grid_y: u32,
    /// Height request.
    pub height: HeightSpec,
    /// Pockets along X; 0 disables pockets.
    pub divx: u32,
    /// Pockets along Y; 0 disables pockets.
    pub divy: u32,
    /// Vertical lid fit input in mm (>= 0).
    pub lid_fit_tolerance: f64,
    /// Grip slots.
    pub grip: GripMode,
    /// Interior floor style.
    pub interior: InteriorStyle,
    /// Output selection.
    pub part: Part,
}

impl Default for BuildParameters {
    fn default() -> Self {
        Self {
            grid_x: 2,
            grid_y: 2,
            height: HeightSpec::units(3.0),
            divx: 0,
            divy: 0,
            lid_fit_tolerance: 0.1,
            grip: GripMode::None,
            interior: InteriorStyle::Minimal,
            part: Part::Bin,
        }
    }
}

macro_rules! keyword_enum {
    ($ty:ident, $field:literal, $expected:literal, { $($text:literal => $variant:ident),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    _ => Err(ConfigError::UnknownVariant {
                        field: $field,
                        value: s.to_string(),
                        expected: $expected,
                    }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let text = match self {
                    $($ty::$variant => $text,)+
                };
                f.write_str(text)
            }
        }
    };
}

keyword_enum!(HeightMode, "height_mode", "units, internal, external", {
    "units" => Units,
    "internal" => Internal,
    "external" => External,
});

keyword_enum!(GripMode, "grip_mode", "none, single, full", {
    "none" => None,
    "single" => Single,
    "full" => Full,
});

keyword_enum!(InteriorStyle, "interior_style", "minimal, partial-raised", {
    "minimal" => Minimal,
    "partial-raised" => PartialRaised,
});

keyword_enum!(Part, "part", "bin, lid, both-closed, both-open, slice", {
    "bin" => Bin,
    "lid" => Lid,
    "both-closed" => BothClosed,
    "both-open" => BothOpen,
    "slice" => Slice,
});
