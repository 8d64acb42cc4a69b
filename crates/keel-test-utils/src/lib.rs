//! Test utilities and instrumented allocators for Keel development.
//!
//! Provides allocator wrappers that count or refuse requests, and
//! degenerate hash functions for driving hash tables into worst-case
//! probing.

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::cell::Cell;
use std::ptr::NonNull;

use keel_core::{Allocator, SYSTEM};

/// System-backed allocator that counts calls and live blocks.
///
/// Lets tests assert that every buffer a container obtained was handed back.
#[derive(Debug, Default)]
pub struct CountingAllocator {
    allocs: Cell<usize>,
    reallocs: Cell<usize>,
    frees: Cell<usize>,
    live: Cell<usize>,
}

impl CountingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks obtained and not yet freed.
    pub fn live_blocks(&self) -> usize {
        self.live.get()
    }

    /// Successful `alloc` calls, plus `realloc(None, ..)` calls.
    pub fn alloc_count(&self) -> usize {
        self.allocs.get()
    }

    /// Successful `realloc` calls on an existing block.
    pub fn realloc_count(&self) -> usize {
        self.reallocs.get()
    }

    /// `free` calls with a block.
    pub fn free_count(&self) -> usize {
        self.frees.get()
    }
}

unsafe impl Allocator for CountingAllocator {
    fn alloc(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let block = SYSTEM.alloc(size, align)?;
        self.allocs.set(self.allocs.get() + 1);
        self.live.set(self.live.get() + 1);
        Some(block)
    }

    unsafe fn realloc(
        &self,
        block: Option<NonNull<u8>>,
        size: usize,
        align: usize,
    ) -> Option<NonNull<u8>> {
        if block.is_none() {
            return self.alloc(size, align);
        }
        // SAFETY: forwarded caller contract; blocks came from SYSTEM.
        let moved = unsafe { SYSTEM.realloc(block, size, align) }?;
        self.reallocs.set(self.reallocs.get() + 1);
        Some(moved)
    }

    unsafe fn free(&self, block: Option<NonNull<u8>>) {
        if block.is_some() {
            self.frees.set(self.frees.get() + 1);
            self.live.set(self.live.get() - 1);
        }
        // SAFETY: forwarded caller contract.
        unsafe { SYSTEM.free(block) }
    }
}

/// System-backed allocator that starts failing after a budget of requests.
///
/// Every `alloc` or `realloc` consumes one unit of budget; once exhausted,
/// all further requests return `None`. Frees always go through.
#[derive(Debug)]
pub struct FailingAllocator {
    budget: Cell<usize>,
}

impl FailingAllocator {
    /// Allow `budget` successful requests, then fail.
    pub fn new(budget: usize) -> Self {
        Self {
            budget: Cell::new(budget),
        }
    }

    /// An allocator that never succeeds.
    pub fn exhausted() -> Self {
        Self::new(0)
    }

    /// Top the budget back up.
    pub fn refill(&self, budget: usize) {
        self.budget.set(budget);
    }

    fn take(&self) -> bool {
        match self.budget.get() {
            0 => false,
            n => {
                self.budget.set(n - 1);
                true
            }
        }
    }
}

unsafe impl Allocator for FailingAllocator {
    fn alloc(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if !self.take() {
            return None;
        }
        SYSTEM.alloc(size, align)
    }

    unsafe fn realloc(
        &self,
        block: Option<NonNull<u8>>,
        size: usize,
        align: usize,
    ) -> Option<NonNull<u8>> {
        if !self.take() {
            return None;
        }
        // SAFETY: forwarded caller contract.
        unsafe { SYSTEM.realloc(block, size, align) }
    }

    unsafe fn free(&self, block: Option<NonNull<u8>>) {
        // SAFETY: forwarded caller contract.
        unsafe { SYSTEM.free(block) }
    }
}

/// Hash function that sends every key to the same probe chain.
pub fn constant_hash<K>(_key: &K) -> u64 {
    !0
}

/// Hash function that uses an integer key as its own hash.
pub fn identity_hash(key: &u64) -> u64 {
    *key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_tracks_live_blocks() {
        let counting = CountingAllocator::new();
        let a = counting.alloc(8, 16).unwrap();
        let b = counting.alloc(8, 16).unwrap();
        assert_eq!(counting.live_blocks(), 2);
        // SAFETY: both blocks came from `counting`.
        unsafe {
            let a = counting.realloc(Some(a), 64, 16).unwrap();
            counting.free(Some(a));
            counting.free(Some(b));
        }
        assert_eq!(counting.live_blocks(), 0);
        assert_eq!(counting.alloc_count(), 2);
        assert_eq!(counting.realloc_count(), 1);
        assert_eq!(counting.free_count(), 2);
    }

    #[test]
    fn failing_respects_budget() {
        let failing = FailingAllocator::new(1);
        let a = failing.alloc(8, 16).unwrap();
        assert!(failing.alloc(8, 16).is_none());
        // SAFETY: `a` came from `failing`.
        unsafe {
            assert!(failing.realloc(Some(a), 16, 16).is_none());
            failing.free(Some(a));
        }
    }
}
