//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The configuration failed validation before any memory was
    /// reserved.
    InvalidConfig {
        /// Which validation rule was violated.
        reason: &'static str,
    },
    /// The backing page reservation failed at construction.
    ///
    /// Fatal to this arena instance; nothing is retried internally and
    /// nothing is leaked on the failure path.
    AllocationFailed {
        /// Number of bytes the reservation asked for.
        requested: usize,
    },
    /// The backing page release failed at teardown.
    ///
    /// Reserved for backings whose release call can fail; the
    /// process-heap backing releases infallibly, so the current build
    /// never produces it. Teardown clears internal state regardless.
    ReleaseFailed,
    /// The requested size was zero or not a multiple of the granularity.
    ///
    /// Always a caller error, rejected before any mutation.
    InvalidSize {
        /// The rejected size.
        requested: usize,
        /// The arena's allocation granularity.
        granularity: usize,
    },
    /// No free block large enough exists.
    ///
    /// The arena performs no reclamation beyond coalescing; the caller
    /// must free something or abandon the request.
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
        /// Size of the largest free block at the time of the request.
        largest_free: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => {
                write!(f, "invalid arena config: {reason}")
            }
            Self::AllocationFailed { requested } => {
                write!(f, "backing page reservation of {requested} bytes failed")
            }
            Self::ReleaseFailed => write!(f, "backing page release failed"),
            Self::InvalidSize {
                requested,
                granularity,
            } => {
                write!(
                    f,
                    "invalid allocation size {requested}: must be a positive multiple of {granularity}"
                )
            }
            Self::OutOfMemory {
                requested,
                largest_free,
            } => {
                write!(
                    f,
                    "out of memory: requested {requested} bytes, largest free block {largest_free} bytes"
                )
            }
        }
    }
}

impl Error for ArenaError {}
