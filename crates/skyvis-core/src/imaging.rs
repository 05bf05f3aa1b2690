//! Imager classification: weighting scheme and imaging algorithm.
//!
//! These two properties are the only part of an imager the engine reads
//! before a run. Together they decide whether a coordinate-only pre-pass
//! must precede the full pass.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// Visibility weighting scheme applied during gridding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Weighting {
    /// Every sample carries unit weight.
    #[default]
    Natural,
    /// Weight proportional to uv distance.
    Radial,
    /// Weight inversely proportional to local uv density.
    Uniform,
}

impl Weighting {
    /// Uniform weighting needs the full uv density before gridding.
    pub fn needs_coords(self) -> bool {
        matches!(self, Self::Uniform)
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Natural => write!(f, "Natural"),
            Self::Radial => write!(f, "Radial"),
            Self::Uniform => write!(f, "Uniform"),
        }
    }
}

impl FromStr for Weighting {
    type Err = ParseImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "natural" => Ok(Self::Natural),
            "radial" => Ok(Self::Radial),
            "uniform" => Ok(Self::Uniform),
            _ => Err(ParseImagingError::UnknownWeighting {
                value: s.to_string(),
            }),
        }
    }
}

/// Algorithm used to turn accumulated visibilities into an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Gridding followed by an FFT.
    #[default]
    Fft,
    /// Gridding with w-dependent convolution kernels.
    WProjection,
    /// 2D direct Fourier transform, no gridding.
    Dft2d,
    /// 3D direct Fourier transform, no gridding.
    Dft3d,
    /// No imaging algorithm declared.
    None,
}

impl Algorithm {
    /// W-projection kernels are sized from the global w range.
    pub fn needs_coords(self) -> bool {
        matches!(self, Self::WProjection)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fft => write!(f, "FFT"),
            Self::WProjection => write!(f, "W-projection"),
            Self::Dft2d => write!(f, "DFT 2D"),
            Self::Dft3d => write!(f, "DFT 3D"),
            Self::None => write!(f, "None"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = ParseImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fft" => Ok(Self::Fft),
            "w-projection" | "w projection" => Ok(Self::WProjection),
            "dft 2d" | "dft2d" => Ok(Self::Dft2d),
            "dft 3d" | "dft3d" => Ok(Self::Dft3d),
            "none" | "" => Ok(Self::None),
            _ => Err(ParseImagingError::UnknownAlgorithm {
                value: s.to_string(),
            }),
        }
    }
}

/// Errors from parsing weighting or algorithm names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseImagingError {
    /// Not one of `Natural`, `Radial`, `Uniform`.
    UnknownWeighting {
        /// The rejected name.
        value: String,
    },
    /// Not one of `FFT`, `W-projection`, `DFT 2D`, `DFT 3D`, `None`.
    UnknownAlgorithm {
        /// The rejected name.
        value: String,
    },
}

impl fmt::Display for ParseImagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownWeighting { value } => write!(f, "unknown weighting '{value}'"),
            Self::UnknownAlgorithm { value } => write!(f, "unknown algorithm '{value}'"),
        }
    }
}

impl Error for ParseImagingError {}

/// Snapshot of an imager's classification, taken before a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagerDescriptor {
    /// Imager name as reported by [`Imager::name`](crate::Imager::name).
    pub name: String,
    /// Declared weighting scheme.
    pub weighting: Weighting,
    /// Declared imaging algorithm.
    pub algorithm: Algorithm,
}

impl ImagerDescriptor {
    /// Whether this imager needs a coordinate-only pre-pass.
    pub fn needs_coords_first(&self) -> bool {
        self.weighting.needs_coords() || self.algorithm.needs_coords()
    }
}
