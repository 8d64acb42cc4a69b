//! Typed buffer management on top of `dyn Allocator`.
//!
//! All raw allocation calls made by the containers go through these
//! helpers, which own the size arithmetic and the alignment choice.

#![allow(unsafe_code)]

use std::mem;
use std::ptr::NonNull;

use keel_core::{min_align_of, AllocError, Allocator};

/// Bytes needed for `count` values of `T`.
pub(crate) fn byte_size<T>(count: usize) -> Result<usize, AllocError> {
    count
        .checked_mul(mem::size_of::<T>())
        .ok_or(AllocError::SizeOverflow {
            count,
            elem_size: mem::size_of::<T>(),
        })
}

/// Allocate uninitialised storage for `count` values of `T`.
pub(crate) fn alloc_buffer<T>(
    allocator: &dyn Allocator,
    count: usize,
) -> Result<NonNull<T>, AllocError> {
    let size = byte_size::<T>(count)?;
    let align = min_align_of::<T>();
    allocator
        .alloc(size, align)
        .map(NonNull::cast)
        .ok_or(AllocError::OutOfMemory { size, align })
}

/// Allocate storage for `count` values of `T` with every byte zeroed.
pub(crate) fn alloc_zeroed_buffer<T>(
    allocator: &dyn Allocator,
    count: usize,
) -> Result<NonNull<T>, AllocError> {
    let buffer = alloc_buffer::<T>(allocator, count)?;
    // SAFETY: the buffer was just allocated for `count` values.
    unsafe { buffer.as_ptr().write_bytes(0, count) };
    Ok(buffer)
}

/// Resize a buffer to hold `count` values of `T`.
///
/// On failure the original buffer is untouched and still owned by the
/// caller.
///
/// # Safety
///
/// `buffer`, if present, must come from `allocator` via one of these helpers
/// for the same `T`.
pub(crate) unsafe fn realloc_buffer<T>(
    allocator: &dyn Allocator,
    buffer: Option<NonNull<T>>,
    count: usize,
) -> Result<NonNull<T>, AllocError> {
    let size = byte_size::<T>(count)?;
    let align = min_align_of::<T>();
    // SAFETY: caller contract; buffers are always allocated at `align`.
    unsafe { allocator.realloc(buffer.map(NonNull::cast), size, align) }
        .map(NonNull::cast)
        .ok_or(AllocError::OutOfMemory { size, align })
}

/// Release a buffer obtained from these helpers. `None` is a no-op.
///
/// # Safety
///
/// `buffer`, if present, must come from `allocator` and not be used again.
pub(crate) unsafe fn free_buffer<T>(allocator: &dyn Allocator, buffer: Option<NonNull<T>>) {
    // SAFETY: caller contract.
    unsafe { allocator.free(buffer.map(NonNull::cast)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::system;

    #[test]
    fn byte_size_detects_overflow() {
        assert_eq!(byte_size::<u32>(10), Ok(40));
        assert!(matches!(
            byte_size::<u64>(usize::MAX),
            Err(AllocError::SizeOverflow { elem_size: 8, .. })
        ));
    }

    #[test]
    fn zeroed_buffer_reads_zero() {
        let buffer = alloc_zeroed_buffer::<u64>(system(), 16).unwrap();
        // SAFETY: 16 zeroed u64s.
        let values = unsafe { std::slice::from_raw_parts(buffer.as_ptr(), 16) };
        assert!(values.iter().all(|&v| v == 0));
        // SAFETY: allocated above from the same allocator.
        unsafe { free_buffer(system(), Some(buffer)) };
    }
}
