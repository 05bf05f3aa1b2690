//! Errors surfaced by [`ImagingSimulator::run()`](crate::ImagingSimulator::run).
//!
//! Every variant is fatal to the current run. Nothing is retried; the
//! collaborator error is carried as the `source()`.

use std::error::Error;
use std::fmt;

use skyvis_core::{BlockIndex, GenerateError, ImagerError, PassKind, PersistError};

use crate::state::RunState;

/// A failure that aborted a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunError {
    /// The generator failed to produce a block.
    Generate {
        /// The pass that was executing.
        pass: PassKind,
        /// The generator error.
        source: GenerateError,
    },
    /// Writing a block to the output sink failed. No imager saw the block.
    Persist {
        /// The block being written.
        index: BlockIndex,
        /// The persister error.
        source: PersistError,
    },
    /// An imager failed to accumulate a block.
    Imager {
        /// Name of the failing imager.
        name: String,
        /// The pass that was executing.
        pass: PassKind,
        /// The block being accumulated.
        index: BlockIndex,
        /// The imager error.
        source: ImagerError,
    },
    /// An imager failed to produce its final image.
    Finalise {
        /// Name of the failing imager.
        name: String,
        /// The imager error.
        source: ImagerError,
    },
    /// Closing the output sink failed.
    Close {
        /// The persister error.
        source: PersistError,
    },
    /// `run()` was called on a simulator that is not idle.
    InvalidState {
        /// The state the simulator was in.
        state: RunState,
    },
    /// The background generator thread failed.
    Producer {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generate { pass, source } => write!(f, "{pass}: {source}"),
            Self::Persist { index, source } => {
                write!(f, "persisting block {index}: {source}")
            }
            Self::Imager {
                name,
                pass,
                index,
                source,
            } => write!(f, "imager '{name}' failed on block {index} of {pass}: {source}"),
            Self::Finalise { name, source } => {
                write!(f, "imager '{name}' failed to finalise: {source}")
            }
            Self::Close { source } => write!(f, "closing output: {source}"),
            Self::InvalidState { state } => {
                write!(f, "run() requires an idle simulator, but it is {state}")
            }
            Self::Producer { reason } => write!(f, "generator thread: {reason}"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Generate { source, .. } => Some(source),
            Self::Persist { source, .. } | Self::Close { source } => Some(source),
            Self::Imager { source, .. } | Self::Finalise { source, .. } => Some(source),
            Self::InvalidState { .. } | Self::Producer { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imager_error_chains_source() {
        let err = RunError::Imager {
            name: "dirty".into(),
            pass: PassKind::Full,
            index: BlockIndex(4),
            source: ImagerError::UpdateFailed {
                reason: "grid overflow".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("'dirty'"));
        assert!(msg.contains("block 4"));
        assert!(err.source().is_some());
    }

    #[test]
    fn invalid_state_has_no_source() {
        let err = RunError::InvalidState {
            state: RunState::Finalised,
        };
        assert!(err.source().is_none());
        assert!(err.to_string().contains("finalised"));
    }
}
