//! Length units and conversion to the canonical unit (meters)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// Length unit understood by plans and the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    /// Meters, the canonical unit
    #[default]
    #[serde(rename = "M", alias = "m")]
    Meter,
    /// Centimeters
    #[serde(rename = "CM", alias = "cm")]
    Centimeter,
    /// Millimeters
    #[serde(rename = "MM", alias = "mm")]
    Millimeter,
}

impl Unit {
    /// All units, in wire order
    pub const ALL: [Unit; 3] = [Unit::Meter, Unit::Centimeter, Unit::Millimeter];

    /// Wire token for this unit ("M", "CM", "MM")
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Meter => "M",
            Unit::Centimeter => "CM",
            Unit::Millimeter => "MM",
        }
    }

    /// Convert a value in this unit to meters
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            Unit::Meter => value,
            Unit::Centimeter => value / 100.0,
            Unit::Millimeter => value / 1000.0,
        }
    }

    /// Convert a value in meters to this unit
    pub fn from_meters(&self, value: f64) -> f64 {
        match self {
            Unit::Meter => value,
            Unit::Centimeter => value * 100.0,
            Unit::Millimeter => value * 1000.0,
        }
    }

    /// Resolve a unit alias (case-insensitive, localized forms included)
    pub fn from_alias(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" | "米" => Some(Unit::Meter),
            "cm" | "cms" | "centimeter" | "centimeters" | "centimetre" | "centimetres" | "厘米" => {
                Some(Unit::Centimeter)
            }
            "mm" | "mms" | "millimeter" | "millimeters" | "millimetre" | "millimetres" | "毫米" => {
                Some(Unit::Millimeter)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_alias(s).ok_or_else(|| Error::Config(format!("Unknown unit: {}", s)))
    }
}

/// Unit attached to a single step parameter
///
/// Plans coming from a remote planner may carry tokens outside the known set.
/// Those are kept verbatim and treated as meters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitHint {
    /// A recognized unit
    Known(Unit),
    /// A token that matched no alias
    Unrecognized(String),
}

impl UnitHint {
    /// Parse a raw unit token
    pub fn parse(token: &str) -> Self {
        match Unit::from_alias(token) {
            Some(unit) => UnitHint::Known(unit),
            None => UnitHint::Unrecognized(token.to_string()),
        }
    }

    /// Convert a length in this unit to meters
    ///
    /// Unrecognized tokens leave the value unchanged.
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            UnitHint::Known(unit) => unit.to_meters(value),
            UnitHint::Unrecognized(token) => {
                warn!(unit = %token, value, "Unknown unit, treating value as meters");
                value
            }
        }
    }

    /// Wire token for this hint
    pub fn as_str(&self) -> &str {
        match self {
            UnitHint::Known(unit) => unit.as_str(),
            UnitHint::Unrecognized(token) => token,
        }
    }
}

impl From<Unit> for UnitHint {
    fn from(unit: Unit) -> Self {
        UnitHint::Known(unit)
    }
}
