//! Scoped [`Allocator`] adapter over an [`Arena`].
//!
//! A [`LinearAllocator`] remembers how full the arena was when it was
//! created and rewinds the arena to that mark when dropped, so everything
//! allocated through it lives exactly as long as the adapter.
//!
//! Adapters on the same arena nest like stack frames. Only the innermost
//! live adapter may allocate; an outer adapter hands out nothing until the
//! inner one is gone, since the inner rewind would otherwise reclaim blocks
//! the outer scope still uses. Allocating through the outer adapter in that
//! state would let a container bound to it read memory the inner drop has
//! already released, so such requests return `None` instead.
//!
//! Adapters dropped out of order are remembered by the arena: their space
//! is reclaimed once every scope nested inside them has closed.

use std::fmt;
use std::ptr::NonNull;

use keel_core::Allocator;

use crate::arena::Arena;

/// Arena-backed allocator whose allocations end with its scope.
///
/// `free` is a no-op; memory comes back only when the adapter is dropped
/// (or the arena is reset).
pub struct LinearAllocator<'a> {
    arena: &'a Arena<'a>,
    /// `arena.allocated()` at construction.
    mark: usize,
    /// Position of this adapter in the arena's scope stack (1-based).
    depth: usize,
}

impl<'a> LinearAllocator<'a> {
    /// Open a new allocation scope on `arena`.
    ///
    /// Any adapter already open on the same arena is suspended until this
    /// one is dropped.
    pub fn new(arena: &'a Arena<'a>) -> Self {
        let depth = arena.open_scope();
        Self {
            arena,
            mark: arena.allocated(),
            depth,
        }
    }

    /// The arena this adapter allocates from.
    pub fn arena(&self) -> &'a Arena<'a> {
        self.arena
    }

    /// The arena's `allocated` value when this adapter was created.
    pub fn mark(&self) -> usize {
        self.mark
    }

    /// Whether this adapter is the innermost live scope on its arena.
    pub fn is_active(&self) -> bool {
        self.arena.scope_depth() == self.depth
    }
}

// SAFETY: blocks come from `Arena::alloc`/`Arena::realloc`, which honour the
// requested alignment and preserve contents on resize. Suspended adapters
// return `None` without touching the arena.
unsafe impl Allocator for LinearAllocator<'_> {
    fn alloc(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if !self.is_active() {
            return None;
        }
        self.arena.alloc(size, align)
    }

    unsafe fn realloc(
        &self,
        block: Option<NonNull<u8>>,
        size: usize,
        align: usize,
    ) -> Option<NonNull<u8>> {
        if !self.is_active() {
            return None;
        }
        // SAFETY: blocks handed to this adapter were served by its arena.
        unsafe { self.arena.realloc(block, size, align) }
    }

    unsafe fn free(&self, _block: Option<NonNull<u8>>) {}
}

impl Drop for LinearAllocator<'_> {
    fn drop(&mut self) {
        self.arena.close_scope(self.depth, self.mark);
    }
}

impl fmt::Debug for LinearAllocator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearAllocator")
            .field("mark", &self.mark)
            .field("depth", &self.depth)
            .field("arena", self.arena)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::{system, MAX_ALIGN};

    #[test]
    fn records_mark_at_creation() {
        let arena = Arena::new(256, system()).unwrap();
        arena.alloc(10, 8).unwrap();
        let linear = LinearAllocator::new(&arena);
        assert_eq!(linear.mark(), arena.allocated());
    }

    #[test]
    fn drop_rewinds_arena() {
        let arena = Arena::new(256, system()).unwrap();
        {
            let linear = LinearAllocator::new(&arena);
            linear.alloc(100, MAX_ALIGN).unwrap();
            assert!(arena.allocated() > 100);
        }
        assert_eq!(arena.allocated(), 0);
    }

    #[test]
    fn free_is_a_noop() {
        let arena = Arena::new(256, system()).unwrap();
        let linear = LinearAllocator::new(&arena);
        let p = linear.alloc(16, MAX_ALIGN).unwrap();
        let before = arena.allocated();
        // SAFETY: p came from this adapter.
        unsafe { linear.free(Some(p)) };
        assert_eq!(arena.allocated(), before);
    }

    #[test]
    fn outer_scope_is_suspended_while_inner_lives() {
        let arena = Arena::new(512, system()).unwrap();
        let outer = LinearAllocator::new(&arena);
        outer.alloc(4, MAX_ALIGN).unwrap();
        {
            let inner = LinearAllocator::new(&arena);
            assert!(inner.is_active());
            assert!(!outer.is_active());
            assert!(outer.alloc(4, MAX_ALIGN).is_none());
            inner.alloc(4, MAX_ALIGN).unwrap();
        }
        assert!(outer.is_active());
        assert!(outer.alloc(4, MAX_ALIGN).is_some());
    }

    #[test]
    fn out_of_order_drop_keeps_inner_blocks() {
        let arena = Arena::new(512, system()).unwrap();
        let outer = LinearAllocator::new(&arena);
        outer.alloc(32, MAX_ALIGN).unwrap();
        let inner = LinearAllocator::new(&arena);
        inner.alloc(32, MAX_ALIGN).unwrap();
        let used = arena.allocated();
        drop(outer);
        assert_eq!(arena.allocated(), used);
        assert!(inner.alloc(8, MAX_ALIGN).is_some());
        drop(inner);
        // The outer scope's blocks go too, and no scope is left open.
        assert_eq!(arena.allocated(), 0);
        assert_eq!(arena.scope_depth(), 0);
        let next = LinearAllocator::new(&arena);
        assert_eq!(next.depth, 1);
        assert!(next.is_active());
    }

    #[test]
    fn reset_clears_leaked_scopes() {
        let mut arena = Arena::new(256, system()).unwrap();
        std::mem::forget(LinearAllocator::new(&arena));
        assert_eq!(arena.scope_depth(), 1);
        arena.reset();
        assert_eq!(arena.scope_depth(), 0);
        assert!(LinearAllocator::new(&arena).is_active());
    }

    #[test]
    fn unwinds_through_every_retired_scope() {
        let arena = Arena::new(512, system()).unwrap();
        let first = LinearAllocator::new(&arena);
        first.alloc(8, MAX_ALIGN).unwrap();
        let second = LinearAllocator::new(&arena);
        second.alloc(8, MAX_ALIGN).unwrap();
        let third = LinearAllocator::new(&arena);
        third.alloc(8, MAX_ALIGN).unwrap();

        drop(second);
        drop(first);
        assert_eq!(arena.scope_depth(), 3);
        drop(third);
        assert_eq!(arena.scope_depth(), 0);
        assert_eq!(arena.allocated(), 0);
    }

    #[test]
    fn retired_scope_waits_for_live_sibling_below() {
        let arena = Arena::new(512, system()).unwrap();
        let first = LinearAllocator::new(&arena);
        first.alloc(8, MAX_ALIGN).unwrap();
        let mark = arena.allocated();
        let second = LinearAllocator::new(&arena);
        let third = LinearAllocator::new(&arena);
        third.alloc(8, MAX_ALIGN).unwrap();

        drop(second);
        drop(third);
        // `first` is still open, so unwinding stops at its frame.
        assert_eq!(arena.allocated(), mark);
        assert!(first.is_active());
        drop(first);
        assert_eq!(arena.allocated(), 0);
    }
}
