//! The allocator capability shared by every Keel container.

use std::mem::{self, MaybeUninit};
use std::ptr::NonNull;

use crate::align::{min_align_of, MAX_ALIGN};

/// A pluggable source of raw memory.
///
/// Containers hold a `&dyn Allocator` for their whole lifetime and call into
/// it from every operation that grows, shrinks or frees their buffer. The
/// trait object plays the role of a capability record: a vtable of three
/// functions plus a pointer to the implementation's state.
///
/// Methods take `&self`. Implementations that keep state (such as the arena
/// adapter) use `Cell`; no implementation is required to be thread-safe.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - a block returned by `alloc`/`realloc` is valid for reads and writes of
///   `size` bytes and aligned to at least `align`;
/// - a failed `alloc`/`realloc` returns `None` and leaves every existing
///   block untouched;
/// - a successful `realloc` of `Some(block)` preserves the first
///   `min(old_size, size)` bytes.
pub unsafe trait Allocator {
    /// Allocate `size` bytes aligned to `align`.
    ///
    /// `align` is a power of two. Returns `None` if the request cannot be
    /// satisfied.
    fn alloc(&self, size: usize, align: usize) -> Option<NonNull<u8>>;

    /// Resize `block` to `size` bytes.
    ///
    /// `realloc(None, ..)` behaves exactly like [`alloc`](Allocator::alloc).
    /// On failure the original block is still valid and owned by the caller.
    ///
    /// # Safety
    ///
    /// `block`, if present, must have been returned by this allocator and not
    /// freed since, and must be aligned to `align`.
    unsafe fn realloc(
        &self,
        block: Option<NonNull<u8>>,
        size: usize,
        align: usize,
    ) -> Option<NonNull<u8>>;

    /// Release `block`. `free(None)` is a no-op.
    ///
    /// # Safety
    ///
    /// `block`, if present, must have been returned by this allocator and not
    /// freed since. It must not be used afterwards.
    unsafe fn free(&self, block: Option<NonNull<u8>>);

    /// [`alloc`](Allocator::alloc) with the default alignment, [`MAX_ALIGN`].
    fn alloc_default(&self, size: usize) -> Option<NonNull<u8>> {
        self.alloc(size, MAX_ALIGN)
    }

    /// [`realloc`](Allocator::realloc) with the default alignment, [`MAX_ALIGN`].
    ///
    /// # Safety
    ///
    /// Same contract as [`realloc`](Allocator::realloc).
    unsafe fn realloc_default(
        &self,
        block: Option<NonNull<u8>>,
        size: usize,
    ) -> Option<NonNull<u8>> {
        // SAFETY: forwarded caller contract.
        unsafe { self.realloc(block, size, MAX_ALIGN) }
    }
}

/// Allocate storage for a single `T` from `allocator`.
///
/// The slot is uninitialised. Release it with [`free_value`] on the same
/// allocator.
pub fn alloc_value<T>(allocator: &dyn Allocator) -> Option<NonNull<MaybeUninit<T>>> {
    allocator
        .alloc(mem::size_of::<T>(), min_align_of::<T>())
        .map(NonNull::cast)
}

/// Release a slot obtained from [`alloc_value`].
///
/// # Safety
///
/// `value` must come from [`alloc_value`] on this same `allocator` and must
/// not be used afterwards. Destructors are not run.
pub unsafe fn free_value<T>(allocator: &dyn Allocator, value: NonNull<MaybeUninit<T>>) {
    // SAFETY: the block was produced by this allocator (caller contract).
    unsafe { allocator.free(Some(value.cast())) }
}
