//! Benchmark profiles for the skyvis imaging simulator.
//!
//! Provides pre-built [`SimulatorConfig`] profiles:
//!
//! - [`reference_profile`]: 16 stations, natural-weighted FFT imaging,
//!   single pass
//! - [`prepass_profile`]: the same observation with a uniform-weighted
//!   and a W-projection imager added, forcing the coordinate pre-pass

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use skyvis_core::{Algorithm, Imager, Weighting};
use skyvis_engine::SimulatorConfig;
use skyvis_sim::{
    GridImager, MemoryPersister, PointSource, PointSourceSimulator, TelescopeLayout,
};

const STATIONS: usize = 16;
const NUM_TIMES: usize = 32;
const TIMES_PER_BLOCK: usize = 4;
const NUM_CHANNELS: usize = 8;
const IMAGE_SIZE: usize = 32;

fn generator() -> Result<PointSourceSimulator, String> {
    PointSourceSimulator::builder()
        .layout(TelescopeLayout::ring(-30.0, STATIONS, 150.0)?)
        .source(PointSource::new(5.0, 0.0, 0.0))
        .source(PointSource::new(1.0, 0.01, 0.02))
        .times(NUM_TIMES, TIMES_PER_BLOCK)
        .channels(NUM_CHANNELS, 110.0e6, 0.5e6)
        .time_axis(60_000.0, 60.0)
        .phase_centre(0.0, -30.0)
        .build()
}

fn imager(name: &str, weighting: Weighting, algorithm: Algorithm) -> Result<GridImager, String> {
    GridImager::builder()
        .name(name)
        .size(IMAGE_SIZE)
        .fov_deg(8.0)
        .weighting(weighting)
        .algorithm(algorithm)
        .w_planes(4)
        .build()
}

/// Single-pass profile: one natural-weighted FFT imager, persisted to
/// memory, generation prefetched `prefetch` blocks ahead.
pub fn reference_profile(prefetch: usize) -> Result<SimulatorConfig, String> {
    let imagers: Vec<Box<dyn Imager>> =
        vec![Box::new(imager("natural", Weighting::Natural, Algorithm::Fft)?)];
    Ok(SimulatorConfig {
        prefetch_blocks: prefetch,
        ..SimulatorConfig::new(Box::new(generator()?), imagers)
            .with_persister(Box::new(MemoryPersister::new()))
    })
}

/// Two-pass profile: natural FFT, uniform FFT and natural W-projection.
pub fn prepass_profile(prefetch: usize) -> Result<SimulatorConfig, String> {
    let imagers: Vec<Box<dyn Imager>> = vec![
        Box::new(imager("natural", Weighting::Natural, Algorithm::Fft)?),
        Box::new(imager("uniform", Weighting::Uniform, Algorithm::Fft)?),
        Box::new(imager("wproj", Weighting::Natural, Algorithm::WProjection)?),
    ];
    Ok(SimulatorConfig {
        prefetch_blocks: prefetch,
        ..SimulatorConfig::new(Box::new(generator()?), imagers)
            .with_persister(Box::new(MemoryPersister::new()))
    })
}
