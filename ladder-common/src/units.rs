//! Linear units and the unit scale table
//!
//! Scale factors convert a source-file unit into meters.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Linear unit of a CAD source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinearUnit {
    Micrometers,
    Millimeters,
    Centimeters,
    Meters,
    Inches,
    Feet,
}

/// Unit scale table (source unit -> meters)
pub const UNIT_SCALES: [(LinearUnit, f64); 6] = [
    (LinearUnit::Micrometers, 0.000001),
    (LinearUnit::Millimeters, 0.001),
    (LinearUnit::Centimeters, 0.01),
    (LinearUnit::Meters, 1.0),
    (LinearUnit::Inches, 0.0254),
    (LinearUnit::Feet, 0.3048),
];

impl LinearUnit {
    /// All units in table order
    pub const ALL: [LinearUnit; 6] = [
        LinearUnit::Micrometers,
        LinearUnit::Millimeters,
        LinearUnit::Centimeters,
        LinearUnit::Meters,
        LinearUnit::Inches,
        LinearUnit::Feet,
    ];

    /// Factor converting this unit into meters
    pub fn scale_to_meters(self) -> f64 {
        UNIT_SCALES
            .iter()
            .find(|(unit, _)| *unit == self)
            .map(|(_, scale)| *scale)
            .unwrap_or(1.0)
    }

    /// Table key for this unit (lowercase plural name)
    pub fn name(self) -> &'static str {
        match self {
            LinearUnit::Micrometers => "micrometers",
            LinearUnit::Millimeters => "millimeters",
            LinearUnit::Centimeters => "centimeters",
            LinearUnit::Meters => "meters",
            LinearUnit::Inches => "inches",
            LinearUnit::Feet => "feet",
        }
    }

    /// Guess the source unit from the largest bounding-box dimension.
    ///
    /// Fixed policy, not a measurement: >1000 → millimeters, >10 → centimeters,
    /// >0.1 → meters, anything smaller falls back to millimeters.
    pub fn estimate_from_extent(max_dimension: f64) -> LinearUnit {
        if max_dimension > 1000.0 {
            LinearUnit::Millimeters
        } else if max_dimension > 10.0 {
            LinearUnit::Centimeters
        } else if max_dimension > 0.1 {
            LinearUnit::Meters
        } else {
            LinearUnit::Millimeters
        }
    }
}

impl fmt::Display for LinearUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LinearUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "micrometers" | "um" => Ok(LinearUnit::Micrometers),
            "millimeters" | "mm" => Ok(LinearUnit::Millimeters),
            "centimeters" | "cm" => Ok(LinearUnit::Centimeters),
            "meters" | "m" => Ok(LinearUnit::Meters),
            "inches" | "in" => Ok(LinearUnit::Inches),
            "feet" | "ft" => Ok(LinearUnit::Feet),
            other => Err(Error::UnknownUnit(other.to_string())),
        }
    }
}

/// Look up a scale factor by unit name (`"meters"`, `"MILLIMETERS"`, `"in"`, ...)
pub fn unit_scale(name: &str) -> Option<f64> {
    name.parse::<LinearUnit>().ok().map(LinearUnit::scale_to_meters)
}

/// Source unit selection: detect from the model, or a fixed unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceUnit {
    #[default]
    Auto,
    Unit(LinearUnit),
}

impl FromStr for SourceUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(SourceUnit::Auto)
        } else {
            s.parse().map(SourceUnit::Unit)
        }
    }
}

impl fmt::Display for SourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceUnit::Auto => f.write_str("auto"),
            SourceUnit::Unit(unit) => unit.fmt(f),
        }
    }
}
