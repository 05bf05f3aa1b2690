//! Core types and traits for the skyvis visibility streaming framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the skyvis workspace:
//! block identifiers, the visibility data model, imager classification,
//! error types, and the collaborator traits the engine drives.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod block;
pub mod error;
pub mod id;
pub mod imaging;
pub mod mode;
pub mod traits;

pub use block::{PhaseCentre, Sample, VisBlock, VisHeader};
pub use error::{GenerateError, ImagerError, PersistError};
pub use id::{BlockIndex, PassKind};
pub use imaging::{Algorithm, ImagerDescriptor, ParseImagingError, Weighting};
pub use mode::{ParsePrecisionError, Precision, RunMode};
pub use traits::{coords_pass_required, describe, BlockGenerator, DescriptorList, Imager, Persister};
