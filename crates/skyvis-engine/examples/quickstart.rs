//! Skyvis quickstart: simulate a small observation and image it twice.
//!
//! Demonstrates:
//!   1. Building a telescope layout and a point-source sky
//!   2. Registering a natural-weighted FFT imager and a uniform-weighted
//!      W-projection imager (the latter forces a coordinate-only pre-pass)
//!   3. Running the simulator with an in-memory persister
//!   4. Reading the run report and the dirty images
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example quickstart

use std::error::Error;

use skyvis_core::{Algorithm, Weighting};
use skyvis_engine::{ImagingSimulator, SimulatorConfig};
use skyvis_sim::{
    GridImager, MemoryPersister, PointSource, PointSourceSimulator, SkyNoise, TelescopeLayout,
};

// ─── Observation parameters ─────────────────────────────────────

const STATIONS: usize = 8;
const RING_RADIUS_M: f64 = 120.0;
const NUM_TIMES: usize = 24;
const TIMES_PER_BLOCK: usize = 4;
const NUM_CHANNELS: usize = 4;
const IMAGE_SIZE: usize = 32;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ─── Generator ──────────────────────────────────────────────

    let layout = TelescopeLayout::ring(-30.7, STATIONS, RING_RADIUS_M)?;
    let generator = PointSourceSimulator::builder()
        .layout(layout)
        .source(PointSource::new(10.0, 0.0, 0.0))
        .source(PointSource::new(3.0, 0.02, -0.01))
        .times(NUM_TIMES, TIMES_PER_BLOCK)
        .channels(NUM_CHANNELS, 120.0e6, 1.0e6)
        .time_axis(60_310.5, 120.0)
        .phase_centre(0.0, -30.7)
        .start_hour_angle(-0.2)
        .noise(SkyNoise::new(vec![0.05; NUM_CHANNELS], 7)?)
        .build()?;

    // ─── Imagers ────────────────────────────────────────────────

    let natural = GridImager::builder()
        .name("natural-fft")
        .size(IMAGE_SIZE)
        .fov_deg(6.0)
        .build()?;
    let uniform = GridImager::builder()
        .name("uniform-wproj")
        .size(IMAGE_SIZE)
        .fov_deg(6.0)
        .weighting(Weighting::Uniform)
        .algorithm(Algorithm::WProjection)
        .w_planes(4)
        .build()?;
    let images = [natural.output(), uniform.output()];

    // ─── Run ────────────────────────────────────────────────────

    let store = MemoryPersister::new();
    let config = SimulatorConfig::new(
        Box::new(generator),
        vec![Box::new(natural), Box::new(uniform)],
    )
    .with_persister(Box::new(store.clone()));
    let mut sim = ImagingSimulator::new(config)?;
    println!("coordinate pre-pass needed: {}", sim.needs_coords_first());

    let report = sim.run()?;
    println!(
        "{} pass(es), {} blocks persisted, {} us total",
        report.passes(),
        store.len(),
        report.total_us
    );
    for (name, us) in &report.full_pass.imager_us {
        println!("  {name:>14}: {us} us in full pass");
    }

    for image in &images {
        if let Some((x, y, peak)) = image.peak() {
            println!("peak {peak:.3} Jy at pixel ({x}, {y})");
        }
    }
    Ok(())
}
