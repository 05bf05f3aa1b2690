//! Reference collaborators for the skyvis imaging simulator.
//!
//! Provides a complete, self-contained set of components that exercise
//! the full engine lifecycle, including the coordinate-only pre-pass:
//!
//! - [`TelescopeLayout`]: station positions and baseline geometry.
//! - [`PointSourceSimulator`]: earth-rotation visibilities of a
//!   point-source sky, with optional [`SkyNoise`].
//! - [`GridImager`]: dirty imaging with natural, radial or uniform
//!   weighting, by gridding, W-projection or direct transform.
//! - [`MemoryPersister`]: keeps written blocks in memory.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod generator;
pub mod imager;
pub mod layout;
pub mod noise;
pub mod persist;

pub use generator::{PointSource, PointSourceSimulator, PointSourceSimulatorBuilder};
pub use imager::{DirtyImage, GridImager, GridImagerBuilder};
pub use layout::{project_uvw, TelescopeLayout, EARTH_ROTATION_RAD_PER_SEC};
pub use noise::{add_sky_noise, SkyNoise};
pub use persist::MemoryPersister;
