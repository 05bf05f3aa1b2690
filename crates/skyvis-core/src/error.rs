//! Error types reported by the collaborators the engine drives.
//!
//! Organised by collaborator: block generation, imaging, and
//! persistence. The engine wraps these in its own run error together
//! with the pass and block at which they surfaced.

use std::error::Error;
use std::fmt;

use crate::id::BlockIndex;

/// Errors from a [`BlockGenerator`](crate::BlockGenerator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerateError {
    /// The generation engine failed while computing a block.
    BlockFailed {
        /// The block being generated.
        index: BlockIndex,
        /// Human-readable description of the failure.
        reason: String,
    },
    /// A block's buffers do not match its declared dimensions.
    MalformedBlock {
        /// The block being assembled.
        index: BlockIndex,
        /// Which buffer was wrong.
        reason: String,
    },
    /// The generator returned a block other than the one requested.
    IndexMismatch {
        /// The index the engine asked for.
        expected: BlockIndex,
        /// The index embedded in the returned block.
        actual: BlockIndex,
    },
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockFailed { index, reason } => {
                write!(f, "block {index} generation failed: {reason}")
            }
            Self::MalformedBlock { index, reason } => {
                write!(f, "block {index} is malformed: {reason}")
            }
            Self::IndexMismatch { expected, actual } => {
                write!(f, "requested block {expected} but generator produced {actual}")
            }
        }
    }
}

impl Error for GenerateError {}

/// Errors from an [`Imager`](crate::Imager).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImagerError {
    /// Accumulating a block failed.
    UpdateFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// Full-pass data arrived before the coordinate statistics the
    /// imager depends on were accumulated.
    CoordsNotAccumulated {
        /// What was missing.
        reason: String,
    },
    /// The header does not describe data this imager can accept.
    HeaderMismatch {
        /// Description of the mismatch.
        reason: String,
    },
    /// Producing the final image failed.
    FinaliseFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for ImagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpdateFailed { reason } => write!(f, "update failed: {reason}"),
            Self::CoordsNotAccumulated { reason } => {
                write!(f, "coordinates not accumulated: {reason}")
            }
            Self::HeaderMismatch { reason } => write!(f, "header mismatch: {reason}"),
            Self::FinaliseFailed { reason } => write!(f, "finalise failed: {reason}"),
        }
    }
}

impl Error for ImagerError {}

/// Errors from a [`Persister`](crate::Persister).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PersistError {
    /// Writing a block to the output sink failed.
    WriteFailed {
        /// The block being written.
        index: BlockIndex,
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The sink was already finalised.
    Closed,
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed { index, reason } => {
                write!(f, "writing block {index} failed: {reason}")
            }
            Self::Closed => write!(f, "output sink already closed"),
        }
    }
}

impl Error for PersistError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_block() {
        let e = GenerateError::BlockFailed {
            index: BlockIndex(3),
            reason: "sky model exhausted".into(),
        };
        assert_eq!(e.to_string(), "block 3 generation failed: sky model exhausted");

        let e = PersistError::WriteFailed {
            index: BlockIndex(9),
            reason: "disk full".into(),
        };
        assert!(e.to_string().contains("block 9"));
    }

    #[test]
    fn index_mismatch_reports_both_sides() {
        let msg = GenerateError::IndexMismatch {
            expected: BlockIndex(2),
            actual: BlockIndex(5),
        }
        .to_string();
        assert!(msg.contains('2') && msg.contains('5'));
    }
}
