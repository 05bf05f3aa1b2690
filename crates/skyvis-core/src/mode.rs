//! Run mode and numeric precision selectors.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

use crate::id::PassKind;

/// Which kind of pass every component is currently executing.
///
/// Replaces a process-wide `coords_only` flag. The engine broadcasts it
/// to the generator and to every imager, and also passes it explicitly
/// into each generate and update call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Only coordinate metadata is computed; nothing is persisted.
    CoordsOnly,
    /// Full sample computation, persistence and imaging.
    #[default]
    Full,
}

impl RunMode {
    /// Map the legacy boolean flag onto a mode.
    pub fn from_coords_only(coords_only: bool) -> Self {
        if coords_only {
            Self::CoordsOnly
        } else {
            Self::Full
        }
    }

    /// `true` for [`RunMode::CoordsOnly`].
    pub fn is_coords_only(self) -> bool {
        matches!(self, Self::CoordsOnly)
    }

    /// The pass this mode executes.
    pub fn pass(self) -> PassKind {
        match self {
            Self::CoordsOnly => PassKind::Coords,
            Self::Full => PassKind::Full,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CoordsOnly => write!(f, "coords-only"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// Numerical precision of the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Precision {
    /// 32-bit floating point samples.
    Single,
    /// 64-bit floating point samples.
    #[default]
    Double,
}

impl Precision {
    /// Round a value to the storage precision.
    pub fn quantise(self, value: f64) -> f64 {
        match self {
            Self::Single => value as f32 as f64,
            Self::Double => value,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Double => write!(f, "double"),
        }
    }
}

/// An unrecognised precision selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsePrecisionError {
    /// The rejected selector.
    pub value: String,
}

impl fmt::Display for ParsePrecisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown precision '{}', expected 'single' or 'double'",
            self.value
        )
    }
}

impl Error for ParsePrecisionError {}

impl FromStr for Precision {
    type Err = ParsePrecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "double" => Ok(Self::Double),
            _ => Err(ParsePrecisionError {
                value: s.to_string(),
            }),
        }
    }
}
