//! The default allocator backed by the platform heap.

use std::ptr::{self, NonNull};

use libc::c_void;

use crate::align::MAX_ALIGN;
use crate::alloc::Allocator;

/// Allocator that delegates to the C heap (`malloc`, `realloc`, `free`).
///
/// The heap already aligns every block to [`MAX_ALIGN`], so the alignment
/// argument is ignored for ordinary requests. Over-aligned requests
/// (`align > MAX_ALIGN`) are served with `posix_memalign` on unix and
/// rejected elsewhere, so a returned block always honours `align`.
///
/// Use the process-wide [`SYSTEM`] instance via [`system()`].
#[derive(Debug, Default)]
pub struct SystemAllocator {
    _private: (),
}

/// The process-wide system allocator.
pub static SYSTEM: SystemAllocator = SystemAllocator { _private: () };

/// The default allocator, as a trait object.
///
/// Every container constructor that does not take an explicit allocator
/// binds to this one.
pub fn system() -> &'static dyn Allocator {
    &SYSTEM
}

impl SystemAllocator {
    #[cfg(unix)]
    fn alloc_overaligned(size: usize, align: usize) -> Option<NonNull<u8>> {
        let mut out: *mut c_void = ptr::null_mut();
        // posix_memalign requires a multiple of sizeof(void*); MAX_ALIGN is one.
        let align = align.max(MAX_ALIGN);
        // SAFETY: `out` is a valid place to store the result.
        let rc = unsafe { libc::posix_memalign(&mut out, align, size.max(1)) };
        if rc != 0 {
            return None;
        }
        NonNull::new(out.cast())
    }

    #[cfg(not(unix))]
    fn alloc_overaligned(_size: usize, _align: usize) -> Option<NonNull<u8>> {
        None
    }
}

// SAFETY: malloc/realloc return MAX_ALIGN-aligned blocks; larger alignments
// go through posix_memalign. realloc preserves the common prefix.
unsafe impl Allocator for SystemAllocator {
    fn alloc(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if align > MAX_ALIGN {
            return Self::alloc_overaligned(size, align);
        }
        // malloc(0) may return null; ask for one byte so success is unambiguous.
        // SAFETY: plain call into the C heap.
        NonNull::new(unsafe { libc::malloc(size.max(1)) }.cast())
    }

    unsafe fn realloc(
        &self,
        block: Option<NonNull<u8>>,
        size: usize,
        align: usize,
    ) -> Option<NonNull<u8>> {
        let Some(block) = block else {
            return self.alloc(size, align);
        };
        if align <= MAX_ALIGN {
            // SAFETY: `block` came from this heap (caller contract).
            let moved = unsafe { libc::realloc(block.as_ptr().cast(), size.max(1)) };
            return NonNull::new(moved.cast());
        }
        // realloc only promises MAX_ALIGN. Reserve the over-aligned target
        // first so a failure leaves `block` untouched.
        let aligned = Self::alloc_overaligned(size, align)?;
        // SAFETY: `block` came from this heap (caller contract).
        let Some(moved) = NonNull::new(unsafe { libc::realloc(block.as_ptr().cast(), size.max(1)) })
        else {
            // SAFETY: `aligned` is a live heap block nobody else has seen.
            unsafe { libc::free(aligned.as_ptr().cast()) };
            return None;
        };
        let moved = moved.cast::<u8>();
        if moved.as_ptr() as usize % align == 0 {
            // SAFETY: as above.
            unsafe { libc::free(aligned.as_ptr().cast()) };
            return Some(moved);
        }
        // SAFETY: both blocks are at least `size` bytes and distinct.
        unsafe {
            ptr::copy_nonoverlapping(moved.as_ptr(), aligned.as_ptr(), size);
            libc::free(moved.as_ptr().cast());
        }
        Some(aligned)
    }

    unsafe fn free(&self, block: Option<NonNull<u8>>) {
        if let Some(block) = block {
            // SAFETY: `block` came from this heap (caller contract).
            unsafe { libc::free(block.as_ptr().cast()) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_honours_max_align() {
        let block = SYSTEM.alloc(100, MAX_ALIGN).unwrap();
        assert_eq!(block.as_ptr() as usize % MAX_ALIGN, 0);
        // SAFETY: block was just allocated by SYSTEM.
        unsafe { SYSTEM.free(Some(block)) };
    }

    #[test]
    fn realloc_none_is_alloc() {
        // SAFETY: passing None is always allowed.
        let block = unsafe { SYSTEM.realloc(None, 32, MAX_ALIGN) }.unwrap();
        // SAFETY: block was just allocated by SYSTEM.
        unsafe { SYSTEM.free(Some(block)) };
    }

    #[test]
    fn free_none_is_noop() {
        // SAFETY: passing None is always allowed.
        unsafe { SYSTEM.free(None) };
    }

    #[test]
    fn realloc_preserves_prefix() {
        let block = SYSTEM.alloc(8, MAX_ALIGN).unwrap();
        // SAFETY: block is valid for 8 bytes, grown block for 4096.
        unsafe {
            ptr::copy_nonoverlapping([1u8, 2, 3, 4, 5, 6, 7, 8].as_ptr(), block.as_ptr(), 8);
            let grown = SYSTEM.realloc(Some(block), 4096, MAX_ALIGN).unwrap();
            let head = std::slice::from_raw_parts(grown.as_ptr(), 8);
            assert_eq!(head, &[1, 2, 3, 4, 5, 6, 7, 8]);
            SYSTEM.free(Some(grown));
        }
    }

    #[cfg(unix)]
    #[test]
    fn overaligned_requests_are_honoured() {
        let block = SYSTEM.alloc(64, 256).unwrap();
        assert_eq!(block.as_ptr() as usize % 256, 0);
        // SAFETY: block is valid for 64 bytes; grown block for 1024.
        unsafe {
            block.as_ptr().write(0xAB);
            let grown = SYSTEM.realloc(Some(block), 1024, 256).unwrap();
            assert_eq!(grown.as_ptr() as usize % 256, 0);
            assert_eq!(grown.as_ptr().read(), 0xAB);
            SYSTEM.free(Some(grown));
        }
    }

    #[test]
    fn system_returns_the_singleton() {
        let a = system() as *const dyn Allocator as *const u8;
        let b = &SYSTEM as *const SystemAllocator as *const u8;
        assert_eq!(a, b);
    }
}
