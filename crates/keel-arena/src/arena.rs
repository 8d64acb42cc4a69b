//! Contiguous bump-allocated byte region with per-block size headers.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use keel_core::{align_up, AllocError, Allocator, MAX_ALIGN};

use crate::config::ArenaConfig;
use crate::error::ArenaError;

/// Arena bookkeeping stored at the start of the backing memory.
#[repr(C)]
struct ArenaHeader {
    /// Usable bytes in the region that follows the header.
    capacity: usize,
    /// Bytes in use, measured from the start of the region.
    allocated: Cell<usize>,
}

/// Size of the arena header that precedes the region.
pub const HEADER_SIZE: usize = mem::size_of::<ArenaHeader>();

/// Size of the per-block header written just before every returned pointer.
pub const BLOCK_HEADER_SIZE: usize = mem::size_of::<usize>();

/// Where the header and region live, and who frees them.
enum Backing<'a> {
    /// Obtained from an allocator; returned to it on drop.
    Allocator(&'a dyn Allocator),
    /// Borrowed from the caller for `'a`.
    Buffer(PhantomData<&'a mut [u8]>),
}

/// A single contiguous byte region served front to back.
///
/// Allocation bumps `allocated` past an alignment pad, a `usize` size header
/// and the payload. The block at the tail can be resized in place; any other
/// resize copies into a fresh tail block and orphans the old one until
/// [`reset`](Arena::reset).
///
/// `allocated` is tracked in a `Cell` so that several
/// [`LinearAllocator`](crate::LinearAllocator)s can share one `&Arena`.
/// Arenas are not thread-safe.
pub struct Arena<'a> {
    header: NonNull<ArenaHeader>,
    backing: Backing<'a>,
    /// Nesting depth of the innermost live linear allocator (0 = none).
    scope_depth: Cell<usize>,
    /// `(depth, mark)` of scopes closed while an inner scope was still open.
    retired: RefCell<Vec<(usize, usize)>>,
}

impl<'a> Arena<'a> {
    /// Allocate a new arena with `capacity` usable bytes from `allocator`.
    ///
    /// Requests `HEADER_SIZE + capacity` bytes aligned to [`MAX_ALIGN`].
    /// The memory goes back to `allocator` when the arena is dropped.
    pub fn new(capacity: usize, allocator: &'a dyn Allocator) -> Result<Self, ArenaError> {
        Self::with_config(ArenaConfig::new(capacity), allocator)
    }

    /// Allocate a new arena sized by `config`.
    pub fn with_config(config: ArenaConfig, allocator: &'a dyn Allocator) -> Result<Self, ArenaError> {
        let total = config.total_bytes().ok_or(AllocError::SizeOverflow {
            count: config.capacity,
            elem_size: 1,
        })?;
        let block = allocator
            .alloc(total, MAX_ALIGN)
            .ok_or(AllocError::OutOfMemory {
                size: total,
                align: MAX_ALIGN,
            })?;
        let header = block.cast::<ArenaHeader>();
        // SAFETY: `block` is MAX_ALIGN-aligned and at least HEADER_SIZE bytes.
        unsafe { header.as_ptr().write(ArenaHeader::new(config.capacity)) };
        Ok(Self {
            header,
            backing: Backing::Allocator(allocator),
            scope_depth: Cell::new(0),
            retired: RefCell::new(Vec::new()),
        })
    }

    /// Build an arena inside a caller-provided buffer.
    ///
    /// The header is placed at the first suitably aligned byte of `buffer`;
    /// the rest becomes the region. For a buffer that is already aligned the
    /// capacity is exactly `buffer.len() - HEADER_SIZE`.
    pub fn from_buffer(buffer: &'a mut [u8]) -> Result<Self, ArenaError> {
        let size = buffer.len();
        let base = buffer.as_mut_ptr();
        let offset = base.align_offset(mem::align_of::<ArenaHeader>());
        let required = offset.saturating_add(HEADER_SIZE);
        if size < required {
            return Err(ArenaError::BufferTooSmall { size, required });
        }
        // SAFETY: `offset + HEADER_SIZE <= size`, so the header fits in bounds
        // at an address aligned for `ArenaHeader`.
        let header = unsafe {
            let header = base.add(offset).cast::<ArenaHeader>();
            header.write(ArenaHeader::new(size - required));
            NonNull::new_unchecked(header)
        };
        Ok(Self {
            header,
            backing: Backing::Buffer(PhantomData),
            scope_depth: Cell::new(0),
            retired: RefCell::new(Vec::new()),
        })
    }

    fn header(&self) -> &ArenaHeader {
        // SAFETY: the header was initialised at construction and lives as
        // long as `self`.
        unsafe { self.header.as_ref() }
    }

    /// Total usable bytes in the region.
    pub fn capacity(&self) -> usize {
        self.header().capacity
    }

    /// Bytes in use, measured from the start of the region.
    pub fn allocated(&self) -> usize {
        self.header().allocated.get()
    }

    /// Bytes still free at the tail.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.allocated()
    }

    /// Pointer to the first byte of the region.
    pub fn data_ptr(&self) -> *mut u8 {
        // The region starts right after the header, inside the same block.
        self.header.as_ptr().wrapping_add(1).cast::<u8>()
    }

    /// Allocate `size` bytes aligned to `align` at the tail of the region.
    ///
    /// The payload size is written to the `usize` just before the returned
    /// pointer. Returns `None` when the region cannot fit the padding, the
    /// header and the payload.
    pub fn alloc(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let header = self.header();
        let allocated = header.allocated.get();
        let data = self.data_ptr();
        let tail = (data as usize).checked_add(allocated)?;
        let start = align_up(tail.checked_add(BLOCK_HEADER_SIZE)?, align)?;
        let padding = start - tail;
        let new_allocated = allocated.checked_add(padding)?.checked_add(size)?;
        if new_allocated > header.capacity {
            return None;
        }
        // SAFETY: `allocated + padding + size <= capacity`, so the block and
        // its header lie inside the region.
        let block = unsafe { data.add(allocated + padding) };
        // SAFETY: as above; the header slot may be unaligned for small `align`.
        unsafe { write_block_size(block, size) };
        header.allocated.set(new_allocated);
        NonNull::new(block)
    }

    /// [`alloc`](Arena::alloc), reporting why the request failed.
    pub fn try_alloc(&self, size: usize, align: usize) -> Result<NonNull<u8>, ArenaError> {
        self.alloc(size, align).ok_or(ArenaError::CapacityExceeded {
            requested: size,
            remaining: self.remaining(),
        })
    }

    /// Resize a block previously served by this arena.
    ///
    /// - `None` behaves like [`alloc`](Arena::alloc).
    /// - The tail block grows or shrinks in place; `None` if growth does not
    ///   fit.
    /// - Any other block is copied into a new tail block (the first
    ///   `min(old, size)` bytes). The old space is orphaned until reset.
    ///
    /// # Panics
    ///
    /// Panics if `block` is not aligned to `align`.
    ///
    /// # Safety
    ///
    /// `block`, if present, must have been returned by this arena since the
    /// last reset (so that a valid size header precedes it).
    #[track_caller]
    pub unsafe fn realloc(
        &self,
        block: Option<NonNull<u8>>,
        size: usize,
        align: usize,
    ) -> Option<NonNull<u8>> {
        let Some(block) = block else {
            return self.alloc(size, align);
        };
        assert!(
            block.as_ptr() as usize % align == 0,
            "arena realloc: block {:p} is not aligned to {align}",
            block.as_ptr(),
        );
        // SAFETY: caller contract; the block was served by this arena.
        let old_size = unsafe { self.block_size(block) };
        let header = self.header();
        let allocated = header.allocated.get();
        let tail = self.data_ptr() as usize + allocated;

        if block.as_ptr() as usize + old_size == tail {
            let new_allocated = (allocated - old_size).checked_add(size)?;
            if new_allocated > header.capacity {
                return None;
            }
            // SAFETY: the header slot precedes a block inside the region.
            unsafe { write_block_size(block.as_ptr(), size) };
            header.allocated.set(new_allocated);
            return Some(block);
        }

        let moved = self.alloc(size, align)?;
        // SAFETY: the new block lies past the old tail, so the ranges are
        // disjoint; both are valid for `min(old_size, size)` bytes.
        unsafe { ptr::copy_nonoverlapping(block.as_ptr(), moved.as_ptr(), old_size.min(size)) };
        Some(moved)
    }

    /// Payload size recorded in the header of `block`.
    ///
    /// # Safety
    ///
    /// `block` must have been returned by this arena since the last reset.
    pub unsafe fn block_size(&self, block: NonNull<u8>) -> usize {
        // SAFETY: caller contract; header slots are written unaligned.
        unsafe {
            block
                .as_ptr()
                .sub(BLOCK_HEADER_SIZE)
                .cast::<usize>()
                .read_unaligned()
        }
    }

    /// Release every block at once without freeing the region.
    ///
    /// Takes `&mut self`: no linear allocator (and therefore no container)
    /// can be borrowing the arena. Raw pointers obtained from
    /// [`alloc`](Arena::alloc) become dangling.
    pub fn reset(&mut self) {
        self.header().allocated.set(0);
        self.scope_depth.set(0);
        self.retired.get_mut().clear();
    }

    pub(crate) fn rewind(&self, mark: usize) {
        self.header().allocated.set(mark);
    }

    pub(crate) fn scope_depth(&self) -> usize {
        self.scope_depth.get()
    }

    /// Push a scope and return its depth.
    pub(crate) fn open_scope(&self) -> usize {
        let depth = self.scope_depth.get() + 1;
        self.scope_depth.set(depth);
        depth
    }

    /// Close the scope at `depth`, whose adapter recorded `mark`.
    ///
    /// Closing the innermost scope rewinds to `mark` and keeps unwinding
    /// through enclosing scopes that were already closed out of order. Any
    /// other scope is only recorded as retired.
    pub(crate) fn close_scope(&self, mut depth: usize, mut mark: usize) {
        let mut retired = self.retired.borrow_mut();
        if depth != self.scope_depth.get() {
            retired.push((depth, mark));
            return;
        }
        loop {
            self.rewind(mark);
            depth -= 1;
            match retired.iter().position(|&(d, _)| d == depth) {
                Some(i) => mark = retired.swap_remove(i).1,
                None => break,
            }
        }
        self.scope_depth.set(depth);
    }
}

impl ArenaHeader {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            allocated: Cell::new(0),
        }
    }
}

/// # Safety
///
/// `block - BLOCK_HEADER_SIZE .. block` must be writable.
unsafe fn write_block_size(block: *mut u8, size: usize) {
    // SAFETY: caller contract.
    unsafe { block.sub(BLOCK_HEADER_SIZE).cast::<usize>().write_unaligned(size) };
}

impl Drop for Arena<'_> {
    fn drop(&mut self) {
        if let Backing::Allocator(allocator) = self.backing {
            // SAFETY: the header block was obtained from this allocator.
            unsafe { allocator.free(Some(self.header.cast())) };
        }
    }
}

impl fmt::Debug for Arena<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("allocated", &self.allocated())
            .finish()
    }
}
