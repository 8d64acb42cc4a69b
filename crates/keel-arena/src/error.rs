//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use keel_core::AllocError;

/// Errors that can occur while building or allocating from an arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The region has no room for the request.
    CapacityExceeded {
        /// Number of payload bytes requested.
        requested: usize,
        /// Bytes still free at the tail of the region.
        remaining: usize,
    },
    /// A caller-provided buffer cannot even hold the arena header.
    BufferTooSmall {
        /// Length of the buffer supplied.
        size: usize,
        /// Minimum length needed (alignment padding plus header).
        required: usize,
    },
    /// The backing allocator could not provide the region.
    Backing(AllocError),
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                remaining,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, {remaining} bytes remaining"
                )
            }
            Self::BufferTooSmall { size, required } => {
                write!(
                    f,
                    "arena buffer too small: got {size} bytes, need at least {required}"
                )
            }
            Self::Backing(err) => write!(f, "arena backing allocation failed: {err}"),
        }
    }
}

impl Error for ArenaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backing(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AllocError> for ArenaError {
    fn from(err: AllocError) -> Self {
        Self::Backing(err)
    }
}
