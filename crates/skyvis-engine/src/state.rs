//! Lifecycle state of an [`ImagingSimulator`](crate::ImagingSimulator).

use std::fmt;

/// A stage of a run at which work happens and failures can occur.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// The coordinate-only pre-pass.
    CoordsPass,
    /// The full pass.
    FullPass,
    /// Finalising the output sink and imagers.
    Finalise,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CoordsPass => write!(f, "coordinate pass"),
            Self::FullPass => write!(f, "full pass"),
            Self::Finalise => write!(f, "finalise"),
        }
    }
}

/// Where a simulator is in its run lifecycle.
///
/// A run moves `Idle → Running(..) → Finalised` on success. Any failure
/// leaves it in `Aborted`, which records the phase that failed; imagers
/// in an aborted simulator hold partial state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Constructed, `run()` not yet called.
    #[default]
    Idle,
    /// Inside `run()`.
    Running(RunPhase),
    /// Every imager was finalised.
    Finalised,
    /// The run failed during the given phase.
    ///
    /// After a pass failure no imager was finalised. After
    /// `Aborted(RunPhase::Finalise)` the output sink may be closed and
    /// the imagers before the failing one are finalised; it and the
    /// imagers after it are not.
    Aborted(RunPhase),
}

impl RunState {
    /// `true` once every imager has been finalised.
    pub fn is_finalised(self) -> bool {
        matches!(self, Self::Finalised)
    }

    /// `true` if the last run failed.
    pub fn is_aborted(self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running(phase) => write!(f, "running ({phase})"),
            Self::Finalised => write!(f, "finalised"),
            Self::Aborted(phase) => write!(f, "aborted during {phase}"),
        }
    }
}
