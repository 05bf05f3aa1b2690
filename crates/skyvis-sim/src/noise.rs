//! Deterministic Gaussian sky noise.
//!
//! Noise for a block is drawn from a ChaCha8 RNG seeded with
//! `seed XOR block_index`, so a block receives identical noise however
//! many times, and in whichever pass, it is generated.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use skyvis_core::{GenerateError, VisBlock};

/// Per-channel noise level and seed.
#[derive(Clone, Debug, PartialEq)]
pub struct SkyNoise {
    stddev_per_channel: Vec<f64>,
    seed: u64,
}

impl SkyNoise {
    /// Noise with standard deviation `stddev_per_channel[c]` (Jy, applied
    /// to both real and imaginary parts) in channel `c`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any deviation is negative or non-finite.
    pub fn new(stddev_per_channel: Vec<f64>, seed: u64) -> Result<Self, String> {
        if let Some((c, s)) = stddev_per_channel
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_finite() || **s < 0.0)
        {
            return Err(format!(
                "noise stddev must be finite and >= 0, got {s} in channel {c}"
            ));
        }
        Ok(Self {
            stddev_per_channel,
            seed,
        })
    }

    /// Deviation per channel.
    pub fn stddev_per_channel(&self) -> &[f64] {
        &self.stddev_per_channel
    }

    /// RNG seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Apply to `block`. See [`add_sky_noise`].
    pub fn apply(&self, block: &mut VisBlock) -> Result<(), GenerateError> {
        add_sky_noise(block, &self.stddev_per_channel, self.seed)
    }
}

/// Gaussian sample via Box-Muller.
fn box_muller(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-300); // avoid ln(0)
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Add Gaussian noise to every sample of `block`.
///
/// Blocks without samples (coordinate-only) are left untouched.
///
/// # Errors
///
/// Returns [`GenerateError::MalformedBlock`] if `stddev_per_channel` does
/// not have one entry per block channel.
pub fn add_sky_noise(
    block: &mut VisBlock,
    stddev_per_channel: &[f64],
    seed: u64,
) -> Result<(), GenerateError> {
    let index = block.index();
    let num_channels = block.num_channels();
    let num_baselines = block.num_baselines();
    if stddev_per_channel.len() != num_channels {
        return Err(GenerateError::MalformedBlock {
            index,
            reason: format!(
                "{} noise levels for {num_channels} channels",
                stddev_per_channel.len()
            ),
        });
    }
    let Some(samples) = block.samples_mut() else {
        return Ok(());
    };

    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ index.0 as u64);
    // Layout is [time][channel][baseline].
    for (i, s) in samples.iter_mut().enumerate() {
        let sigma = stddev_per_channel[(i / num_baselines) % num_channels];
        s.re += sigma * box_muller(&mut rng);
        s.im += sigma * box_muller(&mut rng);
    }
    Ok(())
}
