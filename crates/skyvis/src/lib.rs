//! Skyvis: simulate interferometer visibilities and image them as they
//! are produced.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all skyvis sub-crates. For most users, adding `skyvis` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use skyvis::prelude::*;
//!
//! let generator = PointSourceSimulator::builder()
//!     .layout(TelescopeLayout::ring(-30.0, 4, 40.0).unwrap())
//!     .source(PointSource::new(1.0, 0.0, 0.0))
//!     .times(6, 2)
//!     .build()
//!     .unwrap();
//! let imager = GridImager::builder()
//!     .size(8)
//!     .weighting(Weighting::Uniform)
//!     .build()
//!     .unwrap();
//! let image = imager.output();
//!
//! let config = SimulatorConfig::new(Box::new(generator), vec![Box::new(imager)]);
//! let mut sim = ImagingSimulator::new(config).unwrap();
//! assert!(sim.needs_coords_first());
//!
//! let report = sim.run().unwrap();
//! assert_eq!(report.passes(), 2);
//! assert!(sim.state().is_finalised());
//! assert!(image.pixels().is_some());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `skyvis-core` | Blocks, headers, run mode, imaging kinds, errors, collaborator traits |
//! | [`engine`] | `skyvis-engine` | The imaging simulator, its config, lifecycle and metrics |
//! | [`sim`] | `skyvis-sim` | Reference generator, imager, noise and persister |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Data model and collaborator traits (`skyvis-core`).
///
/// Implement [`types::BlockGenerator`], [`types::Imager`] and
/// [`types::Persister`] to plug your own components into the engine.
pub use skyvis_core as types;

/// The imaging simulator (`skyvis-engine`).
///
/// [`engine::ImagingSimulator`] drives one or two passes and finalises;
/// [`engine::SimulationRun`] is the single-pass lifecycle it wraps.
pub use skyvis_engine as engine;

/// Reference collaborators (`skyvis-sim`).
pub use skyvis_sim as sim;

/// Common imports for typical skyvis usage.
///
/// ```rust
/// use skyvis::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use skyvis_core::{
        Algorithm, BlockGenerator, BlockIndex, Imager, Persister, Precision, RunMode, Sample,
        VisBlock, VisHeader, Weighting,
    };

    // Errors
    pub use skyvis_core::{GenerateError, ImagerError, PersistError};
    pub use skyvis_engine::{ConfigError, RunError};

    // Engine
    pub use skyvis_engine::{ImagingSimulator, PassMetrics, RunReport, RunState, SimulatorConfig};

    // Reference collaborators
    pub use skyvis_sim::{
        GridImager, MemoryPersister, PointSource, PointSourceSimulator, SkyNoise, TelescopeLayout,
    };
}
