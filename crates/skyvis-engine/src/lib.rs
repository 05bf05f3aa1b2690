//! Imaging simulator orchestrating visibility generation, persistence
//! and imagers.
//!
//! Provides [`ImagingSimulator`], which decides whether a coordinate-only
//! pre-pass is needed, drives the generator through one or two passes,
//! fans every block out to the persister and to each registered imager,
//! and finalises them once the full pass has completed.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod error;
pub mod imaging;
pub mod lifecycle;
pub mod metrics;
mod pipeline;
pub mod processor;
pub mod state;

pub use config::{ConfigError, SimulatorConfig, MAX_PREFETCH_BLOCKS};
pub use context::{BlockContext, OutputSink};
pub use error::RunError;
pub use imaging::ImagingSimulator;
pub use lifecycle::SimulationRun;
pub use metrics::{PassMetrics, RunReport};
pub use processor::{BlockProcessor, ImagerSet};
pub use state::{RunPhase, RunState};
