//! Telescope station layout and baseline geometry.
//!
//! Stations are given as local East-North-Up offsets in metres from the
//! array reference point. Baselines are the unordered station pairs
//! `(i, j)` with `i < j`, enumerated in row-major order; block coordinate
//! buffers use the same order.

use std::f64::consts::PI;

/// Earth rotation rate, in radians per second of UT.
pub const EARTH_ROTATION_RAD_PER_SEC: f64 = 7.292_115_9e-5;

/// Station positions of an interferometer.
#[derive(Clone, Debug, PartialEq)]
pub struct TelescopeLayout {
    latitude_rad: f64,
    stations: Vec<[f64; 3]>,
}

impl TelescopeLayout {
    /// Create a layout at `latitude_deg` with stations at ENU offsets.
    ///
    /// # Errors
    ///
    /// Returns `Err` if fewer than 2 stations are given, the latitude is
    /// outside `[-90, 90]`, or any coordinate is non-finite.
    pub fn new(latitude_deg: f64, stations: Vec<[f64; 3]>) -> Result<Self, String> {
        if !latitude_deg.is_finite() || latitude_deg.abs() > 90.0 {
            return Err(format!(
                "latitude must be within [-90, 90] degrees, got {latitude_deg}"
            ));
        }
        if stations.len() < 2 {
            return Err(format!(
                "at least 2 stations required, got {}",
                stations.len()
            ));
        }
        if let Some(i) = stations
            .iter()
            .position(|s| s.iter().any(|c| !c.is_finite()))
        {
            return Err(format!("station {i} has a non-finite coordinate"));
        }
        Ok(Self {
            latitude_rad: latitude_deg.to_radians(),
            stations,
        })
    }

    /// `n` stations evenly spaced on a circle of `radius_m`, at ground level.
    pub fn ring(latitude_deg: f64, n: usize, radius_m: f64) -> Result<Self, String> {
        let stations = (0..n)
            .map(|k| {
                let theta = 2.0 * PI * k as f64 / n.max(1) as f64;
                [radius_m * theta.cos(), radius_m * theta.sin(), 0.0]
            })
            .collect();
        Self::new(latitude_deg, stations)
    }

    /// Array latitude, in radians.
    pub fn latitude_rad(&self) -> f64 {
        self.latitude_rad
    }

    /// Number of stations.
    pub fn num_stations(&self) -> usize {
        self.stations.len()
    }

    /// Number of baselines.
    pub fn num_baselines(&self) -> usize {
        let n = self.stations.len();
        n * (n - 1) / 2
    }

    /// Station index pairs `(i, j)`, `i < j`, in baseline order.
    pub fn baselines(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.stations.len();
        (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
    }

    /// Baseline vectors `station[j] - station[i]` rotated into the
    /// equatorial frame (X towards hour angle 0, Z towards the pole).
    pub fn baseline_xyz(&self) -> Vec<[f64; 3]> {
        let (sin_lat, cos_lat) = self.latitude_rad.sin_cos();
        self.baselines()
            .map(|(i, j)| {
                let a = self.stations[i];
                let b = self.stations[j];
                let (e, n, u) = (b[0] - a[0], b[1] - a[1], b[2] - a[2]);
                [-sin_lat * n + cos_lat * u, e, cos_lat * n + sin_lat * u]
            })
            .collect()
    }
}

/// Project an equatorial baseline onto `(u, v, w)` for the given hour
/// angle and declination, in the baseline's units.
pub fn project_uvw(xyz: [f64; 3], hour_angle_rad: f64, dec_rad: f64) -> (f64, f64, f64) {
    let [x, y, z] = xyz;
    let (sin_h, cos_h) = hour_angle_rad.sin_cos();
    let (sin_d, cos_d) = dec_rad.sin_cos();
    let u = sin_h * x + cos_h * y;
    let v = -sin_d * cos_h * x + sin_d * sin_h * y + cos_d * z;
    let w = cos_d * cos_h * x - cos_d * sin_h * y + sin_d * z;
    (u, v, w)
}
