//! Integration test: arena block layout and linear-allocator scoping.
//!
//! Walks the documented allocation sequence on a 512-byte arena and checks
//! the exact `allocated` value and size header after every step, then
//! checks that nested linear allocators rewind to their marks.

use std::ptr::NonNull;

use keel_arena::{Arena, LinearAllocator, BLOCK_HEADER_SIZE};
use keel_core::{system, Allocator, MAX_ALIGN};
use keel_test_utils::CountingAllocator;

fn header_of(block: NonNull<u8>) -> usize {
    // SAFETY: every block in these tests was served by an arena, which writes
    // a usize size header immediately before it.
    unsafe {
        block
            .as_ptr()
            .sub(BLOCK_HEADER_SIZE)
            .cast::<usize>()
            .read_unaligned()
    }
}

#[test]
fn arena_layout_sequence() {
    let arena = Arena::new(512, system()).unwrap();
    // Scribble over the region so headers are proven to be written.
    // SAFETY: the region is `capacity` bytes long.
    unsafe { arena.data_ptr().write_bytes(0xFF, arena.capacity()) };

    let p1 = arena.alloc(400, 16).unwrap();
    assert_eq!(arena.allocated(), 416);
    assert_eq!(header_of(p1), 400);

    let p2 = arena.alloc(4, 16).unwrap();
    assert_eq!(arena.allocated(), 436);
    assert_eq!(header_of(p2), 4);

    let p3 = arena.alloc(8, 16).unwrap();
    assert_eq!(arena.allocated(), 456);
    assert_eq!(header_of(p3), 8);

    let p4 = arena.alloc(4, 16).unwrap();
    assert_eq!(arena.allocated(), 468);
    assert_eq!(header_of(p4), 4);

    // SAFETY: all blocks below were served by `arena` and are 16-aligned.
    unsafe {
        let grown = arena.realloc(Some(p4), 12, 16).unwrap();
        assert_eq!(grown, p4);
        assert_eq!(arena.allocated(), 476);
        assert_eq!(header_of(p4), 12);

        let shrunk = arena.realloc(Some(p4), 8, 16).unwrap();
        assert_eq!(shrunk, p4);
        assert_eq!(arena.allocated(), 472);

        let moved = arena.realloc(Some(p2), 4, 16).unwrap();
        assert_ne!(moved, p2);
        assert_eq!(arena.allocated(), 484);
        assert_eq!(header_of(moved), 4);
    }
}

#[test]
fn linear_allocator_scoping() {
    let arena = Arena::new(512, system()).unwrap();

    let outer = LinearAllocator::new(&arena);
    assert!(outer.alloc(4, MAX_ALIGN).is_some());
    assert_eq!(arena.allocated(), 20);

    {
        let inner = LinearAllocator::new(&arena);
        assert_eq!(inner.mark(), 20);
        assert!(inner.alloc(4, MAX_ALIGN).is_some());
        assert_eq!(arena.allocated(), 36);
    }
    assert_eq!(arena.allocated(), 20);

    // The outer scope carries on as if the inner one never existed.
    assert!(outer.alloc(4, MAX_ALIGN).is_some());
    assert_eq!(arena.allocated(), 36);
}

#[test]
fn nested_scopes_restore_every_mark() {
    let arena = Arena::new(4096, system()).unwrap();
    let outer = LinearAllocator::new(&arena);
    outer.alloc(100, MAX_ALIGN).unwrap();
    let outer_mark = arena.allocated();

    {
        let middle = LinearAllocator::new(&arena);
        for _ in 0..10 {
            middle.alloc(17, 8).unwrap();
        }
        let middle_mark = arena.allocated();
        {
            let inner = LinearAllocator::new(&arena);
            for size in 1..20 {
                inner.alloc(size, 4).unwrap();
            }
        }
        assert_eq!(arena.allocated(), middle_mark);
    }
    assert_eq!(arena.allocated(), outer_mark);
}

#[test]
fn arena_returns_region_to_its_allocator() {
    let counting = CountingAllocator::new();
    {
        let arena = Arena::new(1024, &counting).unwrap();
        arena.alloc(64, 16).unwrap();
        assert_eq!(counting.live_blocks(), 1);
    }
    assert_eq!(counting.live_blocks(), 0);
}
