//! Allocation error types.

use std::error::Error;
use std::fmt;

/// Errors surfaced when a container cannot obtain memory.
///
/// These are the recoverable ("soft") failures of the library. Programmer
/// errors such as out-of-range indices are panics, not `AllocError`s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The allocator returned no block for the request.
    OutOfMemory {
        /// Number of bytes requested.
        size: usize,
        /// Alignment requested.
        align: usize,
    },
    /// `count * elem_size` does not fit in `usize`.
    SizeOverflow {
        /// Number of elements requested.
        count: usize,
        /// Size of a single element in bytes.
        elem_size: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { size, align } => {
                write!(f, "out of memory: requested {size} bytes aligned to {align}")
            }
            Self::SizeOverflow { count, elem_size } => {
                write!(
                    f,
                    "allocation size overflow: {count} elements of {elem_size} bytes"
                )
            }
        }
    }
}

impl Error for AllocError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_request() {
        let err = AllocError::OutOfMemory {
            size: 4096,
            align: 16,
        };
        assert_eq!(
            err.to_string(),
            "out of memory: requested 4096 bytes aligned to 16"
        );
    }

    #[test]
    fn overflow_display() {
        let err = AllocError::SizeOverflow {
            count: usize::MAX,
            elem_size: 8,
        };
        assert!(err.to_string().contains("8 bytes"));
    }
}
