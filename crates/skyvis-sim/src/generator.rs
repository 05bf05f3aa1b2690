//! Point-source visibility generator.
//!
//! Simulates an interferometer observing a sky of point sources. Baseline
//! coordinates follow earth rotation: at global time index `t` the hour
//! angle is `start_hour_angle + ω·t·time_inc`. Each source contributes
//!
//! ```text
//! V(u, v, w) = S · exp(-2πi (u·l + v·m + w·(n - 1)))
//! ```
//!
//! with `(u, v, w)` in wavelengths and `n = sqrt(1 - l² - m²)`.
//!
//! In [`RunMode::CoordsOnly`] only coordinates are computed; source
//! evaluation and noise are skipped entirely.
//!
//! Constructed via the builder pattern: [`PointSourceSimulator::builder`].

use std::f64::consts::PI;
use std::sync::Arc;

use skyvis_core::{
    BlockGenerator, BlockIndex, GenerateError, PhaseCentre, Precision, RunMode, Sample, VisBlock,
    VisHeader,
};

use crate::layout::{project_uvw, TelescopeLayout, EARTH_ROTATION_RAD_PER_SEC};
use crate::noise::SkyNoise;

/// An unresolved source at direction cosines `(l, m)` from the phase
/// centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointSource {
    /// Flux density, Jy.
    pub flux_jy: f64,
    /// Direction cosine towards east.
    pub l: f64,
    /// Direction cosine towards north.
    pub m: f64,
}

impl PointSource {
    /// A source of `flux_jy` at `(l, m)`.
    pub fn new(flux_jy: f64, l: f64, m: f64) -> Self {
        Self { flux_jy, l, m }
    }

    fn n_minus_one(&self) -> f64 {
        (1.0 - self.l * self.l - self.m * self.m).sqrt() - 1.0
    }
}

/// Generates blocks for a fixed observation of a point-source sky.
#[derive(Debug)]
pub struct PointSourceSimulator {
    header: Arc<VisHeader>,
    baselines_xyz: Vec<[f64; 3]>,
    sources: Vec<PointSource>,
    start_hour_angle_rad: f64,
    noise: Option<SkyNoise>,
}

/// Builder for [`PointSourceSimulator`].
///
/// Required field: `layout`.
pub struct PointSourceSimulatorBuilder {
    layout: Option<TelescopeLayout>,
    sources: Vec<PointSource>,
    precision: Precision,
    num_times: usize,
    max_times_per_block: usize,
    num_channels: usize,
    freq_start_hz: f64,
    freq_inc_hz: f64,
    time_start_mjd_utc: f64,
    time_inc_sec: f64,
    phase_centre: PhaseCentre,
    start_hour_angle_rad: f64,
    noise: Option<SkyNoise>,
}

impl PointSourceSimulator {
    /// Create a new builder.
    ///
    /// Defaults: double precision, 1 time sample per block, 1 channel at
    /// 100 MHz, 10 s sampling, phase centre at the origin.
    pub fn builder() -> PointSourceSimulatorBuilder {
        PointSourceSimulatorBuilder {
            layout: None,
            sources: Vec::new(),
            precision: Precision::Double,
            num_times: 1,
            max_times_per_block: 1,
            num_channels: 1,
            freq_start_hz: 100.0e6,
            freq_inc_hz: 0.0,
            time_start_mjd_utc: 0.0,
            time_inc_sec: 10.0,
            phase_centre: PhaseCentre::default(),
            start_hour_angle_rad: 0.0,
            noise: None,
        }
    }

    /// The simulated sky.
    pub fn sources(&self) -> &[PointSource] {
        &self.sources
    }

    /// Configured noise, if any.
    pub fn noise(&self) -> Option<&SkyNoise> {
        self.noise.as_ref()
    }

    fn coordinates(&self, times: std::ops::Range<usize>) -> [Vec<f64>; 3] {
        let nb = self.baselines_xyz.len();
        let cap = times.len() * nb;
        let (mut uu, mut vv, mut ww) = (
            Vec::with_capacity(cap),
            Vec::with_capacity(cap),
            Vec::with_capacity(cap),
        );
        let dec = self.header.phase_centre.dec_deg.to_radians();
        for t in times {
            let ha = self.start_hour_angle_rad
                + EARTH_ROTATION_RAD_PER_SEC * t as f64 * self.header.time_inc_sec;
            for xyz in &self.baselines_xyz {
                let (u, v, w) = project_uvw(*xyz, ha, dec);
                uu.push(u);
                vv.push(v);
                ww.push(w);
            }
        }
        [uu, vv, ww]
    }

    fn amplitudes(&self, num_times: usize, uvw: &[Vec<f64>; 3]) -> Vec<Sample> {
        let nb = self.baselines_xyz.len();
        let nc = self.header.num_channels;
        let precision = self.header.precision;
        let mut samples = Vec::with_capacity(num_times * nc * nb);
        for t in 0..num_times {
            for c in 0..nc {
                let inv_lambda = 1.0 / self.header.wavelength_m(c);
                for b in 0..nb {
                    let i = t * nb + b;
                    let (u, v, w) = (
                        uvw[0][i] * inv_lambda,
                        uvw[1][i] * inv_lambda,
                        uvw[2][i] * inv_lambda,
                    );
                    let mut acc = Sample::default();
                    for s in &self.sources {
                        let phase = -2.0 * PI * (u * s.l + v * s.m + w * s.n_minus_one());
                        acc += Sample::from_polar(s.flux_jy, phase);
                    }
                    samples.push(Sample::new(
                        precision.quantise(acc.re),
                        precision.quantise(acc.im),
                    ));
                }
            }
        }
        samples
    }
}

impl PointSourceSimulatorBuilder {
    /// Set the station layout (required).
    pub fn layout(mut self, layout: TelescopeLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Add a point source.
    pub fn source(mut self, source: PointSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Set the sample precision (default: double).
    pub fn precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Set the total number of time samples and the block size.
    pub fn times(mut self, num_times: usize, max_times_per_block: usize) -> Self {
        self.num_times = num_times;
        self.max_times_per_block = max_times_per_block;
        self
    }

    /// Set the channel axis.
    pub fn channels(mut self, num_channels: usize, freq_start_hz: f64, freq_inc_hz: f64) -> Self {
        self.num_channels = num_channels;
        self.freq_start_hz = freq_start_hz;
        self.freq_inc_hz = freq_inc_hz;
        self
    }

    /// Set the observation start (MJD UTC) and sampling interval.
    pub fn time_axis(mut self, start_mjd_utc: f64, inc_sec: f64) -> Self {
        self.time_start_mjd_utc = start_mjd_utc;
        self.time_inc_sec = inc_sec;
        self
    }

    /// Set the phase centre.
    pub fn phase_centre(mut self, ra_deg: f64, dec_deg: f64) -> Self {
        self.phase_centre = PhaseCentre { ra_deg, dec_deg };
        self
    }

    /// Set the hour angle of the first sample, in radians (default: 0).
    pub fn start_hour_angle(mut self, radians: f64) -> Self {
        self.start_hour_angle_rad = radians;
        self
    }

    /// Add Gaussian sky noise to every full-mode block.
    pub fn noise(mut self, noise: SkyNoise) -> Self {
        self.noise = Some(noise);
        self
    }

    /// Build the generator, validating all configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `layout` is not set
    /// - the resulting header fails [`VisHeader::validate`]
    /// - a source lies outside the unit circle or has non-finite flux
    /// - the noise levels do not cover every channel
    pub fn build(self) -> Result<PointSourceSimulator, String> {
        let layout = self
            .layout
            .ok_or_else(|| "layout is required".to_string())?;

        let header = VisHeader {
            precision: self.precision,
            num_stations: layout.num_stations(),
            num_times_total: self.num_times,
            max_times_per_block: self.max_times_per_block,
            num_channels: self.num_channels,
            freq_start_hz: self.freq_start_hz,
            freq_inc_hz: self.freq_inc_hz,
            time_start_mjd_utc: self.time_start_mjd_utc,
            time_inc_sec: self.time_inc_sec,
            phase_centre: self.phase_centre,
        };
        header.validate()?;

        for (i, s) in self.sources.iter().enumerate() {
            if !s.flux_jy.is_finite() {
                return Err(format!("source {i} has non-finite flux {}", s.flux_jy));
            }
            let r2 = s.l * s.l + s.m * s.m;
            if !r2.is_finite() || r2 >= 1.0 {
                return Err(format!(
                    "source {i} at (l={}, m={}) lies outside the visible hemisphere",
                    s.l, s.m
                ));
            }
        }

        if let Some(noise) = &self.noise {
            if noise.stddev_per_channel().len() != self.num_channels {
                return Err(format!(
                    "{} noise levels for {} channels",
                    noise.stddev_per_channel().len(),
                    self.num_channels
                ));
            }
        }

        Ok(PointSourceSimulator {
            header: Arc::new(header),
            baselines_xyz: layout.baseline_xyz(),
            sources: self.sources,
            start_hour_angle_rad: self.start_hour_angle_rad,
            noise: self.noise,
        })
    }
}

impl BlockGenerator for PointSourceSimulator {
    fn header(&self) -> Arc<VisHeader> {
        Arc::clone(&self.header)
    }

    fn generate_block(
        &mut self,
        index: BlockIndex,
        mode: RunMode,
    ) -> Result<VisBlock, GenerateError> {
        let times = self
            .header
            .block_times(index)
            .ok_or_else(|| GenerateError::BlockFailed {
                index,
                reason: format!(
                    "observation has only {} blocks",
                    self.header.num_blocks()
                ),
            })?;
        let num_times = times.len();
        let start = times.start;
        let uvw = self.coordinates(times);
        let samples = match mode {
            RunMode::CoordsOnly => None,
            RunMode::Full => Some(self.amplitudes(num_times, &uvw)),
        };

        let mut block = VisBlock::new(
            index,
            start,
            num_times,
            self.header.num_channels,
            self.baselines_xyz.len(),
            uvw,
            samples,
        )?;
        if let Some(noise) = &self.noise {
            noise.apply(&mut block)?;
        }
        Ok(block)
    }
}
