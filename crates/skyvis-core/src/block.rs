//! The visibility data model: [`VisHeader`] and [`VisBlock`].
//!
//! A header describes the whole observation and is shared read-only by
//! every consumer of a run. Blocks are contiguous time slices of that
//! observation, produced one at a time by a generator and dropped once
//! every consumer has seen them.

use std::ops::{Add, AddAssign, Mul, Range};

use crate::error::GenerateError;
use crate::id::BlockIndex;
use crate::mode::Precision;

/// Speed of light in vacuum, metres per second.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// One complex visibility sample, in Jansky.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    /// Real part.
    pub re: f64,
    /// Imaginary part.
    pub im: f64,
}

impl Sample {
    /// Build a sample from its parts.
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// `amplitude * exp(i * phase)`.
    pub fn from_polar(amplitude: f64, phase: f64) -> Self {
        let (s, c) = phase.sin_cos();
        Self::new(amplitude * c, amplitude * s)
    }

    /// Complex conjugate.
    pub fn conj(self) -> Self {
        Self::new(self.re, -self.im)
    }

    /// Modulus.
    pub fn norm(self) -> f64 {
        self.re.hypot(self.im)
    }
}

impl Add for Sample {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl AddAssign for Sample {
    fn add_assign(&mut self, rhs: Self) {
        self.re += rhs.re;
        self.im += rhs.im;
    }
}

impl Mul<f64> for Sample {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.re * rhs, self.im * rhs)
    }
}

impl Mul for Sample {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

/// Equatorial pointing of the observation, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhaseCentre {
    /// Right ascension.
    pub ra_deg: f64,
    /// Declination.
    pub dec_deg: f64,
}

/// Describes the full observation of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct VisHeader {
    /// Storage precision of the samples.
    pub precision: Precision,
    /// Number of stations; baselines are all unordered station pairs.
    pub num_stations: usize,
    /// Number of time samples in the whole observation.
    pub num_times_total: usize,
    /// Maximum number of time samples in one block.
    pub max_times_per_block: usize,
    /// Number of frequency channels.
    pub num_channels: usize,
    /// Centre frequency of channel 0, in Hz.
    pub freq_start_hz: f64,
    /// Channel separation, in Hz.
    pub freq_inc_hz: f64,
    /// Start of the observation, MJD(UTC).
    pub time_start_mjd_utc: f64,
    /// Time between samples, in seconds.
    pub time_inc_sec: f64,
    /// Pointing direction.
    pub phase_centre: PhaseCentre,
}

impl VisHeader {
    /// Number of baselines, `n * (n - 1) / 2`.
    pub fn num_baselines(&self) -> usize {
        self.num_stations * self.num_stations.saturating_sub(1) / 2
    }

    /// Number of blocks a pass over this observation produces.
    pub fn num_blocks(&self) -> usize {
        if self.max_times_per_block == 0 {
            return 0;
        }
        self.num_times_total.div_ceil(self.max_times_per_block)
    }

    /// Range of global time indices covered by block `index`.
    ///
    /// Returns `None` if `index` is past the last block.
    pub fn block_times(&self, index: BlockIndex) -> Option<Range<usize>> {
        if index.0 >= self.num_blocks() {
            return None;
        }
        let start = index.0 * self.max_times_per_block;
        let end = (start + self.max_times_per_block).min(self.num_times_total);
        Some(start..end)
    }

    /// Centre frequency of a channel, in Hz.
    pub fn frequency_hz(&self, channel: usize) -> f64 {
        self.freq_start_hz + channel as f64 * self.freq_inc_hz
    }

    /// Wavelength of a channel, in metres.
    pub fn wavelength_m(&self, channel: usize) -> f64 {
        SPEED_OF_LIGHT / self.frequency_hz(channel)
    }

    /// Check structural invariants.
    ///
    /// Returns `Err` with a description if the header describes an
    /// observation that cannot be split into blocks.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_stations < 2 {
            return Err(format!(
                "at least 2 stations required, got {}",
                self.num_stations
            ));
        }
        if self.num_channels == 0 {
            return Err("num_channels must be at least 1".to_string());
        }
        if self.max_times_per_block == 0 {
            return Err("max_times_per_block must be at least 1".to_string());
        }
        if !self.freq_start_hz.is_finite() || self.freq_start_hz <= 0.0 {
            return Err(format!(
                "freq_start_hz must be finite and positive, got {}",
                self.freq_start_hz
            ));
        }
        if !self.freq_inc_hz.is_finite() {
            return Err(format!("freq_inc_hz must be finite, got {}", self.freq_inc_hz));
        }
        let last = self.frequency_hz(self.num_channels - 1);
        if last <= 0.0 {
            return Err(format!(
                "channel {} has non-positive frequency {last}",
                self.num_channels - 1
            ));
        }
        if !self.time_inc_sec.is_finite() || self.time_inc_sec < 0.0 {
            return Err(format!(
                "time_inc_sec must be finite and >= 0, got {}",
                self.time_inc_sec
            ));
        }
        Ok(())
    }
}

/// A contiguous time slice of the observation.
///
/// Coordinates `uu`, `vv`, `ww` are in metres and laid out
/// `[time][baseline]`. Samples, when present, are laid out
/// `[time][channel][baseline]`. Blocks produced in coordinate-only mode
/// carry no samples.
#[derive(Clone, Debug, PartialEq)]
pub struct VisBlock {
    index: BlockIndex,
    start_time_index: usize,
    num_times: usize,
    num_channels: usize,
    num_baselines: usize,
    uu: Vec<f64>,
    vv: Vec<f64>,
    ww: Vec<f64>,
    samples: Option<Vec<Sample>>,
}

impl VisBlock {
    /// Assemble a block, checking every buffer against its dimensions.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: BlockIndex,
        start_time_index: usize,
        num_times: usize,
        num_channels: usize,
        num_baselines: usize,
        uvw: [Vec<f64>; 3],
        samples: Option<Vec<Sample>>,
    ) -> Result<Self, GenerateError> {
        let [uu, vv, ww] = uvw;
        let coord_len = num_times * num_baselines;
        for (axis, buf) in [("uu", &uu), ("vv", &vv), ("ww", &ww)] {
            if buf.len() != coord_len {
                return Err(GenerateError::MalformedBlock {
                    index,
                    reason: format!("{axis} has {} entries, expected {coord_len}", buf.len()),
                });
            }
        }
        if let Some(s) = &samples {
            let expected = coord_len * num_channels;
            if s.len() != expected {
                return Err(GenerateError::MalformedBlock {
                    index,
                    reason: format!("{} samples, expected {expected}", s.len()),
                });
            }
        }
        Ok(Self {
            index,
            start_time_index,
            num_times,
            num_channels,
            num_baselines,
            uu,
            vv,
            ww,
            samples,
        })
    }

    /// Position of this block in the pass.
    pub fn index(&self) -> BlockIndex {
        self.index
    }

    /// Global time index of the first time sample in this block.
    pub fn start_time_index(&self) -> usize {
        self.start_time_index
    }

    /// Number of time samples in this block.
    pub fn num_times(&self) -> usize {
        self.num_times
    }

    /// Number of frequency channels.
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Number of baselines.
    pub fn num_baselines(&self) -> usize {
        self.num_baselines
    }

    /// Baseline u coordinates, metres.
    pub fn uu(&self) -> &[f64] {
        &self.uu
    }

    /// Baseline v coordinates, metres.
    pub fn vv(&self) -> &[f64] {
        &self.vv
    }

    /// Baseline w coordinates, metres.
    pub fn ww(&self) -> &[f64] {
        &self.ww
    }

    /// `(u, v, w)` in metres for one time/baseline pair.
    pub fn uvw(&self, time: usize, baseline: usize) -> (f64, f64, f64) {
        let i = time * self.num_baselines + baseline;
        (self.uu[i], self.vv[i], self.ww[i])
    }

    /// Whether this block carries visibility samples.
    pub fn has_samples(&self) -> bool {
        self.samples.is_some()
    }

    /// All samples, `[time][channel][baseline]`.
    pub fn samples(&self) -> Option<&[Sample]> {
        self.samples.as_deref()
    }

    /// Mutable samples, for generators post-processing a block they own.
    pub fn samples_mut(&mut self) -> Option<&mut [Sample]> {
        self.samples.as_deref_mut()
    }

    /// One sample, if present.
    pub fn sample(&self, time: usize, channel: usize, baseline: usize) -> Option<Sample> {
        let i = (time * self.num_channels + channel) * self.num_baselines + baseline;
        self.samples.as_ref().and_then(|s| s.get(i).copied())
    }

    /// Total number of time/channel/baseline points.
    pub fn len(&self) -> usize {
        self.num_times * self.num_channels * self.num_baselines
    }

    /// `true` if the block covers no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
