//! Arena configuration parameters.

use crate::arena::HEADER_SIZE;

/// Configuration for an allocator-backed [`Arena`](crate::Arena).
///
/// Immutable once the arena is built; the region never grows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Usable bytes in the region, excluding the arena header.
    ///
    /// Default: 65_536 (64KB). Each block additionally consumes a `usize`
    /// size header plus alignment padding out of this budget.
    pub capacity: usize,
}

impl ArenaConfig {
    /// Default region size in bytes.
    pub const DEFAULT_CAPACITY: usize = 64 * 1024;

    /// Create a config for a region of `capacity` usable bytes.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Bytes requested from the backing allocator: header plus region.
    ///
    /// Returns `None` if the sum overflows `usize`.
    pub fn total_bytes(&self) -> Option<usize> {
        HEADER_SIZE.checked_add(self.capacity)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_64kb() {
        assert_eq!(ArenaConfig::default().capacity, 64 * 1024);
    }

    #[test]
    fn total_bytes_includes_header() {
        let config = ArenaConfig::new(512);
        assert_eq!(config.total_bytes(), Some(512 + HEADER_SIZE));
        assert_eq!(ArenaConfig::new(usize::MAX).total_bytes(), None);
    }
}
