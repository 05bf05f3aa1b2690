//! Strongly-typed identifiers for blocks and passes.

use std::fmt;

/// Position of a block in the ordered sequence of one pass.
///
/// Zero-based and strictly increasing within a pass. The coordinate-only
/// pass and the full pass iterate the same sequence, so `BlockIndex(n)`
/// refers to the same slice of the observation in both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockIndex(pub usize);

impl BlockIndex {
    /// The index following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for BlockIndex {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// Which of the (at most two) passes of a run is executing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// The coordinate-only pre-pass.
    Coords,
    /// The full simulation pass that persists and images real samples.
    Full,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coords => write!(f, "coordinate pass"),
            Self::Full => write!(f, "full pass"),
        }
    }
}
