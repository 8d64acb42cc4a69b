//! Alignment and power-of-two helpers.

use std::mem;

/// Largest alignment every allocator guarantees without being asked.
///
/// Equal to `2 * size_of::<usize>()` (16 on 64-bit targets), which matches
/// what the platform heap hands out for any request.
pub const MAX_ALIGN: usize = 2 * mem::size_of::<usize>();

/// Alignment containers request when allocating storage for `T`.
///
/// At least [`MAX_ALIGN`], or `align_of::<T>()` for over-aligned types.
pub const fn min_align_of<T>() -> usize {
    if mem::align_of::<T>() <= MAX_ALIGN {
        MAX_ALIGN
    } else {
        mem::align_of::<T>()
    }
}

/// Round an address up to the next multiple of `align`.
///
/// Returns `None` if the rounded address would overflow `usize`.
///
/// # Panics
///
/// Panics in debug builds if `align` is not a power of two.
#[inline]
pub fn align_up(addr: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two(), "alignment {align} is not a power of two");
    let mask = align - 1;
    Some(addr.checked_add(mask)? & !mask)
}

/// Align a pointer up to `align`, keeping its provenance.
///
/// Computes `(p + a - 1) & !(a - 1)`. The result may point past the end of
/// the allocation `ptr` belongs to; callers bounds-check before using it.
#[inline]
pub fn alignptr(ptr: *mut u8, align: usize) -> *mut u8 {
    debug_assert!(align.is_power_of_two(), "alignment {align} is not a power of two");
    let offset = (ptr as usize).wrapping_neg() & (align - 1);
    ptr.wrapping_add(offset)
}

/// Smallest power of two that is `>= n`.
///
/// `nextpow2(1) == 1`.
///
/// # Panics
///
/// Panics if `n == 0` or if the result does not fit in a `u64`.
#[inline]
#[track_caller]
pub fn nextpow2(n: u64) -> u64 {
    assert!(n != 0, "nextpow2 is undefined for 0");
    if n == 1 {
        return 1;
    }
    let shift = u64::BITS - (n - 1).leading_zeros();
    assert!(shift < u64::BITS, "nextpow2({n}) overflows u64");
    1u64 << shift
}
