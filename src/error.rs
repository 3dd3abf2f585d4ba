use std::collections::TryReserveError;
use std::{error, fmt};

/// Errors surfaced by the fallible paths named in the engines' contracts.
///
/// Not-found lookups, duplicate inserts, unknown contigs, and queries made
/// before indexing are *not* represented here; those are sentinel results
/// (`None`, an empty sequence, or a logged warning), exactly as specified.
#[derive(Debug)]
pub enum IntervalTreeError {
    /// The fixed-capacity descent stack (64 frames) was exhausted. Balanced
    /// and self-adjusting trees bound their depth analytically and cannot
    /// reach this; the implicit engine can, for a contig with more records
    /// than `2^64` supports, which is not a realistic input.
    DepthExceeded,
    /// Growing a backing allocation failed.
    Reserve(TryReserveError),
}

impl fmt::Display for IntervalTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthExceeded => write!(f, "tree depth exceeds the fixed descent stack capacity"),
            Self::Reserve(err) => write!(f, "failed to grow backing storage: {err}"),
        }
    }
}

impl error::Error for IntervalTreeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::DepthExceeded => None,
            Self::Reserve(err) => Some(err),
        }
    }
}

impl From<TryReserveError> for IntervalTreeError {
    fn from(err: TryReserveError) -> Self {
        Self::Reserve(err)
    }
}
