//! Gridding imager producing a dirty image.
//!
//! The image is `size × size` pixels spanning `fov` radians in `l` and
//! `m`, so the uv cell is `1 / fov` wavelengths. Every visibility is also
//! gridded at its Hermitian conjugate `(-u, -v)`.
//!
//! # Passes
//!
//! - **Coordinate pass** (`RunMode::CoordsOnly`): counts visibilities per
//!   uv cell and tracks the largest `|w|`. Needed by uniform weighting
//!   (the density) and W-projection (the w-plane range).
//! - **Full pass**: weights each sample (natural 1, radial `|uv|`,
//!   uniform `1 / density`) and accumulates it.
//!
//! # Algorithms
//!
//! - `FFT`: nearest-cell gridding, separable inverse transform.
//! - `W-projection`: as `FFT`, but samples are stacked into `w_planes`
//!   planes across the pre-pass `|w|` range; each plane is transformed
//!   and corrected by its w-phase screen.
//! - `DFT 2D` / `DFT 3D`: samples are kept and each pixel is a direct sum,
//!   `DFT 3D` including the `w(n - 1)` term.
//!
//! `finalise` normalises by the sum of weights, so an isolated point
//! source of flux `S` peaks at `S`.

use std::f64::consts::PI;
use std::sync::{Arc, OnceLock};

use smallvec::SmallVec;

use skyvis_core::{Algorithm, Imager, ImagerError, RunMode, Sample, VisBlock, VisHeader, Weighting};

/// Relative slack allowed on `|w|` against the coordinate-pass maximum.
const W_TOLERANCE: f64 = 1e-9;

/// A weighted sample kept for direct transforms.
#[derive(Clone, Copy, Debug)]
struct Point {
    u: f64,
    v: f64,
    w: f64,
    vis: Sample,
}

/// Shared, write-once handle to a finalised dirty image.
///
/// Obtained from [`GridImager::output`] before the imager is handed to
/// the simulator.
#[derive(Clone, Debug)]
pub struct DirtyImage {
    size: usize,
    pixels: Arc<OnceLock<Vec<f64>>>,
}

impl DirtyImage {
    /// Pixels per side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// `[m][l]` row-major pixels, once the imager has finalised.
    pub fn pixels(&self) -> Option<&[f64]> {
        self.pixels.get().map(Vec::as_slice)
    }

    /// One pixel; `(size/2, size/2)` is the phase centre.
    pub fn pixel(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.pixels().map(|img| img[y * self.size + x])
    }

    /// `(x, y, value)` of the brightest pixel.
    pub fn peak(&self) -> Option<(usize, usize, f64)> {
        let img = self.pixels()?;
        let (i, v) = img
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        Some((i % self.size, i / self.size, v))
    }
}

/// Gridding imager.
#[derive(Debug)]
pub struct GridImager {
    name: String,
    size: usize,
    fov_rad: f64,
    weighting: Weighting,
    algorithm: Algorithm,
    w_planes: usize,
    mode: RunMode,

    density: Vec<f64>,
    w_max: f64,
    coords_blocks: usize,
    coords_complete: bool,

    grids: Vec<Vec<Sample>>,
    points: Vec<Point>,
    weight_sum: f64,
    full_blocks: usize,
    dropped: usize,

    image: DirtyImage,
}

/// Builder for [`GridImager`].
pub struct GridImagerBuilder {
    name: String,
    size: usize,
    fov_deg: f64,
    weighting: Weighting,
    algorithm: Algorithm,
    w_planes: usize,
}

impl GridImager {
    /// Create a new builder.
    ///
    /// Defaults: 64 pixels over 2 degrees, natural weighting, FFT,
    /// 8 w-planes.
    pub fn builder() -> GridImagerBuilder {
        GridImagerBuilder {
            name: "grid".to_string(),
            size: 64,
            fov_deg: 2.0,
            weighting: Weighting::Natural,
            algorithm: Algorithm::Fft,
            w_planes: 8,
        }
    }

    /// Pixels per image side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Angular size of one pixel, radians.
    pub fn cell_size_rad(&self) -> f64 {
        self.fov_rad / self.size as f64
    }

    /// Visibilities per uv cell seen during the coordinate pass,
    /// `[v][u]` with the origin at `(size/2, size/2)`.
    pub fn density(&self) -> &[f64] {
        &self.density
    }

    /// Largest `|w|` seen during the coordinate pass, in wavelengths.
    pub fn w_max(&self) -> f64 {
        self.w_max
    }

    /// Blocks accumulated in the coordinate pass.
    pub fn coords_blocks(&self) -> usize {
        self.coords_blocks
    }

    /// Blocks accumulated in the full pass.
    pub fn full_blocks(&self) -> usize {
        self.full_blocks
    }

    /// Samples that fell outside the uv grid and were skipped.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Sum of all applied weights.
    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    /// A handle that sees the image once this imager finalises.
    pub fn output(&self) -> DirtyImage {
        self.image.clone()
    }

    /// The dirty image, `[m][l]` row-major, once finalised.
    pub fn image(&self) -> Option<&[f64]> {
        self.image.pixels()
    }

    /// One image pixel; `(size/2, size/2)` is the phase centre.
    pub fn pixel(&self, x: usize, y: usize) -> Option<f64> {
        self.image.pixel(x, y)
    }

    fn is_finalised(&self) -> bool {
        self.image.pixels().is_some()
    }

    /// Grid cells for `(u, v)` in wavelengths: the cell itself and its
    /// conjugate, flagged `true`. Empty if outside the grid.
    fn cells(&self, u: f64, v: f64) -> SmallVec<[(usize, bool); 2]> {
        let mut out = SmallVec::new();
        let du = 1.0 / self.fov_rad;
        let half = (self.size / 2) as i64;
        let iu = (u / du).round() as i64;
        let iv = (v / du).round() as i64;
        for (su, sv, conj) in [(iu, iv, false), (-iu, -iv, true)] {
            let (x, y) = (su + half, sv + half);
            if x < 0 || y < 0 || x >= self.size as i64 || y >= self.size as i64 {
                return SmallVec::new();
            }
            out.push((y as usize * self.size + x as usize, conj));
        }
        out
    }

    fn uses_w_planes(&self) -> bool {
        self.algorithm == Algorithm::WProjection && self.w_planes > 1 && self.w_max > 0.0
    }

    fn plane_w(&self, plane: usize) -> f64 {
        if !self.uses_w_planes() {
            return 0.0;
        }
        -self.w_max + plane as f64 * 2.0 * self.w_max / (self.w_planes - 1) as f64
    }

    fn plane_of(&self, w: f64) -> usize {
        if !self.uses_w_planes() {
            return 0;
        }
        let frac = (w + self.w_max) / (2.0 * self.w_max);
        let idx = (frac * (self.w_planes - 1) as f64).round();
        (idx.max(0.0) as usize).min(self.w_planes - 1)
    }

    fn num_grids(&self) -> usize {
        match self.algorithm {
            Algorithm::WProjection => self.w_planes,
            Algorithm::Fft => 1,
            Algorithm::Dft2d | Algorithm::Dft3d | Algorithm::None => 0,
        }
    }

    fn check_block(header: &VisHeader, block: &VisBlock) -> Result<(), ImagerError> {
        if block.num_channels() != header.num_channels
            || block.num_baselines() != header.num_baselines()
        {
            return Err(ImagerError::HeaderMismatch {
                reason: format!(
                    "block {} has {} channels x {} baselines, header has {} x {}",
                    block.index(),
                    block.num_channels(),
                    block.num_baselines(),
                    header.num_channels,
                    header.num_baselines()
                ),
            });
        }
        Ok(())
    }

    fn accumulate_coords(&mut self, header: &VisHeader, block: &VisBlock) {
        for t in 0..block.num_times() {
            for b in 0..block.num_baselines() {
                let (u_m, v_m, w_m) = block.uvw(t, b);
                for c in 0..block.num_channels() {
                    let inv_lambda = 1.0 / header.wavelength_m(c);
                    let (u, v) = (u_m * inv_lambda, v_m * inv_lambda);
                    for (idx, _) in self.cells(u, v) {
                        self.density[idx] += 1.0;
                    }
                    self.w_max = self.w_max.max((w_m * inv_lambda).abs());
                }
            }
        }
        self.coords_blocks += 1;
    }

    fn accumulate_samples(&mut self, header: &VisHeader, block: &VisBlock) -> Result<(), ImagerError> {
        if self.needs_coords_first() && !self.coords_complete {
            return Err(ImagerError::CoordsNotAccumulated {
                reason: format!(
                    "{} / {} needs a completed coordinate pass before block {}",
                    self.weighting,
                    self.algorithm,
                    block.index()
                ),
            });
        }
        if !block.has_samples() {
            return Err(ImagerError::UpdateFailed {
                reason: format!("block {} carries no samples", block.index()),
            });
        }
        if self.grids.is_empty() && self.num_grids() > 0 {
            self.grids = vec![vec![Sample::default(); self.size * self.size]; self.num_grids()];
        }

        for t in 0..block.num_times() {
            for c in 0..block.num_channels() {
                let inv_lambda = 1.0 / header.wavelength_m(c);
                for b in 0..block.num_baselines() {
                    let Some(sample) = block.sample(t, c, b) else {
                        continue;
                    };
                    let (u_m, v_m, w_m) = block.uvw(t, b);
                    let (u, v, w) = (u_m * inv_lambda, v_m * inv_lambda, w_m * inv_lambda);
                    self.accumulate_one(block, u, v, w, sample)?;
                }
            }
        }
        self.full_blocks += 1;
        Ok(())
    }

    fn accumulate_one(
        &mut self,
        block: &VisBlock,
        u: f64,
        v: f64,
        w: f64,
        sample: Sample,
    ) -> Result<(), ImagerError> {
        if self.algorithm == Algorithm::WProjection
            && w.abs() > self.w_max * (1.0 + W_TOLERANCE) + f64::EPSILON
        {
            return Err(ImagerError::UpdateFailed {
                reason: format!(
                    "block {}: |w| = {:.3} exceeds coordinate-pass maximum {:.3}",
                    block.index(),
                    w.abs(),
                    self.w_max
                ),
            });
        }
        let cells = self.cells(u, v);
        let weight = match self.weighting {
            Weighting::Natural => 1.0,
            Weighting::Radial => u.hypot(v),
            Weighting::Uniform => {
                let Some(&(idx, _)) = cells.first() else {
                    self.dropped += 1;
                    return Ok(());
                };
                let density = self.density[idx];
                if density <= 0.0 {
                    return Err(ImagerError::CoordsNotAccumulated {
                        reason: format!(
                            "block {}: uv cell ({u:.1}, {v:.1}) was not seen in the coordinate pass",
                            block.index()
                        ),
                    });
                }
                1.0 / density
            }
        };
        let vis = sample * weight;

        match self.algorithm {
            Algorithm::Fft | Algorithm::WProjection => {
                if cells.is_empty() {
                    self.dropped += 1;
                    return Ok(());
                }
                for (idx, conj) in cells {
                    let (plane, value) = if conj {
                        (self.plane_of(-w), vis.conj())
                    } else {
                        (self.plane_of(w), vis)
                    };
                    self.grids[plane][idx] += value;
                    self.weight_sum += weight;
                }
            }
            Algorithm::Dft2d | Algorithm::Dft3d | Algorithm::None => {
                self.points.push(Point { u, v, w, vis });
                self.weight_sum += weight;
            }
        }
        Ok(())
    }

    /// Separable inverse transform of one grid to a complex image.
    fn transform(&self, grid: &[Sample]) -> Vec<Sample> {
        let n = self.size;
        let half = (n / 2) as f64;
        // twiddle[k * n + x] = exp(2πi (k - h)(x - h) / n)
        let twiddle: Vec<Sample> = (0..n * n)
            .map(|i| {
                let (k, x) = ((i / n) as f64 - half, (i % n) as f64 - half);
                Sample::from_polar(1.0, 2.0 * PI * k * x / n as f64)
            })
            .collect();

        // Along u: rows[v][x].
        let mut rows = vec![Sample::default(); n * n];
        for v in 0..n {
            for k in 0..n {
                let g = grid[v * n + k];
                if g == Sample::default() {
                    continue;
                }
                for x in 0..n {
                    rows[v * n + x] += g * twiddle[k * n + x];
                }
            }
        }
        // Along v: image[y][x].
        let mut image = vec![Sample::default(); n * n];
        for v in 0..n {
            for y in 0..n {
                let t = twiddle[v * n + y];
                for x in 0..n {
                    image[y * n + x] += rows[v * n + x] * t;
                }
            }
        }
        image
    }

    fn direction(&self, x: usize, y: usize) -> (f64, f64) {
        let half = (self.size / 2) as f64;
        let cell = self.cell_size_rad();
        ((x as f64 - half) * cell, (y as f64 - half) * cell)
    }

    fn n_minus_one(l: f64, m: f64) -> Option<f64> {
        let r2 = l * l + m * m;
        (r2 < 1.0).then(|| (1.0 - r2).sqrt() - 1.0)
    }

    fn direct_image(&self) -> Vec<f64> {
        let n = self.size;
        let with_w = self.algorithm == Algorithm::Dft3d;
        let mut image = vec![0.0; n * n];
        for y in 0..n {
            for x in 0..n {
                let (l, m) = self.direction(x, y);
                let Some(nm1) = Self::n_minus_one(l, m) else {
                    continue;
                };
                image[y * n + x] = self
                    .points
                    .iter()
                    .map(|p| {
                        let w_term = if with_w { p.w * nm1 } else { 0.0 };
                        let phase = 2.0 * PI * (p.u * l + p.v * m + w_term);
                        (p.vis * Sample::from_polar(1.0, phase)).re
                    })
                    .sum();
            }
        }
        image
    }

    fn gridded_image(&self) -> Vec<f64> {
        let n = self.size;
        let mut image = vec![0.0; n * n];
        for (plane, grid) in self.grids.iter().enumerate() {
            let w = self.plane_w(plane);
            let planar = self.transform(grid);
            for y in 0..n {
                for x in 0..n {
                    let (l, m) = self.direction(x, y);
                    let Some(nm1) = Self::n_minus_one(l, m) else {
                        continue;
                    };
                    let screen = Sample::from_polar(1.0, 2.0 * PI * w * nm1);
                    image[y * n + x] += (planar[y * n + x] * screen).re;
                }
            }
        }
        image
    }
}

impl GridImagerBuilder {
    /// Set the imager name (default: `"grid"`).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the image size in pixels per side (default: 64).
    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set the field of view in degrees (default: 2).
    pub fn fov_deg(mut self, fov_deg: f64) -> Self {
        self.fov_deg = fov_deg;
        self
    }

    /// Set the weighting scheme (default: natural).
    pub fn weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Set the algorithm (default: FFT).
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the number of w-planes used by W-projection (default: 8).
    pub fn w_planes(mut self, w_planes: usize) -> Self {
        self.w_planes = w_planes;
        self
    }

    /// Build the imager, validating all configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `size` is less than 2
    /// - `fov_deg` is not in `(0, 180)`
    /// - `w_planes` is 0
    /// - `algorithm` is [`Algorithm::None`]
    pub fn build(self) -> Result<GridImager, String> {
        if self.size < 2 {
            return Err(format!("size must be at least 2, got {}", self.size));
        }
        if !self.fov_deg.is_finite() || self.fov_deg <= 0.0 || self.fov_deg >= 180.0 {
            return Err(format!(
                "fov_deg must be within (0, 180), got {}",
                self.fov_deg
            ));
        }
        if self.w_planes == 0 {
            return Err("w_planes must be at least 1".to_string());
        }
        if self.algorithm == Algorithm::None {
            return Err("an imaging algorithm is required".to_string());
        }
        Ok(GridImager {
            name: self.name,
            size: self.size,
            fov_rad: self.fov_deg.to_radians(),
            weighting: self.weighting,
            algorithm: self.algorithm,
            w_planes: self.w_planes,
            mode: RunMode::Full,
            density: vec![0.0; self.size * self.size],
            w_max: 0.0,
            coords_blocks: 0,
            coords_complete: false,
            grids: Vec::new(),
            points: Vec::new(),
            weight_sum: 0.0,
            full_blocks: 0,
            dropped: 0,
            image: DirtyImage {
                size: self.size,
                pixels: Arc::new(OnceLock::new()),
            },
        })
    }
}

impl Imager for GridImager {
    fn name(&self) -> &str {
        &self.name
    }

    fn weighting(&self) -> Weighting {
        self.weighting
    }

    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Leaving coordinate-only mode after seeing blocks completes the
    /// coordinate pass.
    fn set_coords_only(&mut self, mode: RunMode) {
        if self.mode.is_coords_only() && mode == RunMode::Full && self.coords_blocks > 0 {
            self.coords_complete = true;
        }
        self.mode = mode;
    }

    fn update_from_block(
        &mut self,
        mode: RunMode,
        header: &VisHeader,
        block: &VisBlock,
    ) -> Result<(), ImagerError> {
        if self.is_finalised() {
            return Err(ImagerError::UpdateFailed {
                reason: "imager already finalised".to_string(),
            });
        }
        Self::check_block(header, block)?;
        match mode {
            RunMode::CoordsOnly => {
                self.accumulate_coords(header, block);
                Ok(())
            }
            RunMode::Full => self.accumulate_samples(header, block),
        }
    }

    fn finalise(&mut self) -> Result<(), ImagerError> {
        if self.is_finalised() {
            return Err(ImagerError::FinaliseFailed {
                reason: "imager already finalised".to_string(),
            });
        }
        if self.weight_sum <= 0.0 {
            return Err(ImagerError::FinaliseFailed {
                reason: format!("{}: no visibilities were accumulated", self.name),
            });
        }
        let mut image = match self.algorithm {
            Algorithm::Fft | Algorithm::WProjection => self.gridded_image(),
            Algorithm::Dft2d | Algorithm::Dft3d | Algorithm::None => self.direct_image(),
        };
        for px in &mut image {
            *px /= self.weight_sum;
        }
        if self.image.pixels.set(image).is_err() {
            return Err(ImagerError::FinaliseFailed {
                reason: "image already published".to_string(),
            });
        }
        self.grids = Vec::new();
        self.points = Vec::new();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyvis_core::{BlockGenerator, BlockIndex};

    use crate::generator::{PointSource, PointSourceSimulator};
    use crate::layout::TelescopeLayout;

    fn generator_at(radius_m: f64, dec_deg: f64, source: PointSource) -> PointSourceSimulator {
        PointSourceSimulator::builder()
            .layout(TelescopeLayout::ring(-30.0, 5, radius_m).unwrap())
            .source(source)
            .times(4, 2)
            .channels(1, 150.0e6, 0.0)
            .phase_centre(0.0, dec_deg)
            .build()
            .unwrap()
    }

    fn generator(source: PointSource) -> PointSourceSimulator {
        generator_at(60.0, -30.0, source)
    }

    fn imager(weighting: Weighting, algorithm: Algorithm) -> GridImager {
        GridImager::builder()
            .size(16)
            .fov_deg(8.0)
            .weighting(weighting)
            .algorithm(algorithm)
            .build()
            .unwrap()
    }

    /// Drive both passes by hand, the way the simulator does.
    fn image_with(im: &mut GridImager, gen: &mut PointSourceSimulator) {
        let header = gen.header();
        let n = header.num_blocks();
        if im.needs_coords_first() {
            im.set_coords_only(RunMode::CoordsOnly);
            for i in 0..n {
                let block = gen.generate_block(BlockIndex(i), RunMode::CoordsOnly).unwrap();
                im.update_from_block(RunMode::CoordsOnly, &header, &block).unwrap();
            }
            im.set_coords_only(RunMode::Full);
        }
        for i in 0..n {
            let block = gen.generate_block(BlockIndex(i), RunMode::Full).unwrap();
            im.update_from_block(RunMode::Full, &header, &block).unwrap();
        }
        im.finalise().unwrap();
    }

    // ---------------------------------------------------------------
    // Builder tests
    // ---------------------------------------------------------------

    #[test]
    fn builder_rejects_bad_size_and_fov() {
        assert!(GridImager::builder().size(1).build().is_err());
        assert!(GridImager::builder().fov_deg(0.0).build().is_err());
        assert!(GridImager::builder().fov_deg(f64::NAN).build().is_err());
        assert!(GridImager::builder().w_planes(0).build().is_err());
        assert!(GridImager::builder()
            .algorithm(Algorithm::None)
            .build()
            .is_err());
    }

    #[test]
    fn classification_follows_configuration() {
        assert!(!imager(Weighting::Natural, Algorithm::Fft).needs_coords_first());
        assert!(imager(Weighting::Uniform, Algorithm::Fft).needs_coords_first());
        assert!(imager(Weighting::Radial, Algorithm::WProjection).needs_coords_first());
        assert!(!imager(Weighting::Radial, Algorithm::Dft3d).needs_coords_first());
    }

    // ---------------------------------------------------------------
    // Imaging tests
    // ---------------------------------------------------------------

    #[test]
    fn centred_source_peaks_at_flux_for_every_algorithm() {
        for algorithm in [
            Algorithm::Fft,
            Algorithm::WProjection,
            Algorithm::Dft2d,
            Algorithm::Dft3d,
        ] {
            for weighting in [Weighting::Natural, Weighting::Radial, Weighting::Uniform] {
                let mut im = imager(weighting, algorithm);
                let mut gen = generator(PointSource::new(1.5, 0.0, 0.0));
                image_with(&mut im, &mut gen);
                let centre = im.pixel(8, 8).unwrap();
                assert!(
                    (centre - 1.5).abs() < 1e-9,
                    "{weighting}/{algorithm}: centre = {centre}"
                );
            }
        }
    }

    #[test]
    fn dft3d_recovers_offset_source_at_its_pixel() {
        let mut im = imager(Weighting::Natural, Algorithm::Dft3d);
        let output = im.output();
        let cell = im.cell_size_rad();
        let mut gen = generator(PointSource::new(2.0, 3.0 * cell, -2.0 * cell));
        image_with(&mut im, &mut gen);
        let at_source = output.pixel(11, 6).unwrap();
        assert!((at_source - 2.0).abs() < 1e-9, "got {at_source}");
    }

    #[test]
    fn coordinate_pass_fills_density_and_w_range() {
        let mut im = imager(Weighting::Uniform, Algorithm::WProjection);
        let mut gen = generator(PointSource::new(1.0, 0.0, 0.0));
        let header = gen.header();
        im.set_coords_only(RunMode::CoordsOnly);
        let block = gen.generate_block(BlockIndex(0), RunMode::CoordsOnly).unwrap();
        im.update_from_block(RunMode::CoordsOnly, &header, &block).unwrap();
        assert_eq!(im.coords_blocks(), 1);
        let total: f64 = im.density().iter().sum();
        assert!(total > 0.0 && total <= 2.0 * block.len() as f64);
        assert_eq!(total % 2.0, 0.0, "every cell is counted with its conjugate");
        assert!(im.w_max() > 0.0);
        assert_eq!(im.weight_sum(), 0.0);
    }

    #[test]
    fn uniform_without_coordinate_pass_fails() {
        let mut im = imager(Weighting::Uniform, Algorithm::Fft);
        let mut gen = generator(PointSource::new(1.0, 0.0, 0.0));
        let header = gen.header();
        let block = gen.generate_block(BlockIndex(0), RunMode::Full).unwrap();
        match im.update_from_block(RunMode::Full, &header, &block) {
            Err(ImagerError::CoordsNotAccumulated { .. }) => {}
            other => panic!("expected CoordsNotAccumulated, got {other:?}"),
        }
    }

    #[test]
    fn w_beyond_prepass_range_fails() {
        let mut im = imager(Weighting::Natural, Algorithm::WProjection);
        // Same station count, six times the baseline lengths.
        let mut compact = generator_at(10.0, 0.0, PointSource::new(1.0, 0.0, 0.0));
        let mut extended = generator_at(60.0, 0.0, PointSource::new(1.0, 0.0, 0.0));
        let header = compact.header();
        im.set_coords_only(RunMode::CoordsOnly);
        let coords = compact
            .generate_block(BlockIndex(0), RunMode::CoordsOnly)
            .unwrap();
        im.update_from_block(RunMode::CoordsOnly, &header, &coords).unwrap();
        im.set_coords_only(RunMode::Full);
        assert!(im.w_max() > 0.0);

        let block = extended.generate_block(BlockIndex(0), RunMode::Full).unwrap();
        match im.update_from_block(RunMode::Full, &header, &block) {
            Err(ImagerError::UpdateFailed { reason }) => assert!(reason.contains("|w|")),
            other => panic!("expected UpdateFailed, got {other:?}"),
        }
    }

    #[test]
    fn coords_block_without_samples_rejected_in_full_mode() {
        let mut im = imager(Weighting::Natural, Algorithm::Fft);
        let mut gen = generator(PointSource::new(1.0, 0.0, 0.0));
        let header = gen.header();
        let block = gen.generate_block(BlockIndex(0), RunMode::CoordsOnly).unwrap();
        match im.update_from_block(RunMode::Full, &header, &block) {
            Err(ImagerError::UpdateFailed { .. }) => {}
            other => panic!("expected UpdateFailed, got {other:?}"),
        }
    }

    #[test]
    fn header_mismatch_rejected() {
        let mut im = imager(Weighting::Natural, Algorithm::Fft);
        let mut gen = generator(PointSource::new(1.0, 0.0, 0.0));
        let block = gen.generate_block(BlockIndex(0), RunMode::Full).unwrap();
        let mut other = (*gen.header()).clone();
        other.num_channels = 3;
        match im.update_from_block(RunMode::Full, &other, &block) {
            Err(ImagerError::HeaderMismatch { .. }) => {}
            other => panic!("expected HeaderMismatch, got {other:?}"),
        }
    }

    #[test]
    fn finalise_without_data_fails_and_twice_fails() {
        let mut im = imager(Weighting::Natural, Algorithm::Fft);
        assert!(matches!(
            im.finalise(),
            Err(ImagerError::FinaliseFailed { .. })
        ));

        let mut gen = generator(PointSource::new(1.0, 0.0, 0.0));
        image_with(&mut im, &mut gen);
        assert_eq!(im.image().unwrap().len(), 16 * 16);
        assert!(matches!(
            im.finalise(),
            Err(ImagerError::FinaliseFailed { .. })
        ));
    }
}
