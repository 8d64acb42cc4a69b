//! Integration test: containers running on every allocator flavour.
//!
//! The same workloads run on the system heap, on an instrumented allocator
//! and on a linear allocator over an arena, and must agree on results.
//! Arena-backed runs also check that closing the scope hands every byte
//! back.

use keel_arena::{Arena, LinearAllocator};
use keel_collections::{hash_fnv1a, Array, OwnedSpan, Span, Table};
use keel_core::{system, Allocator};
use keel_test_utils::CountingAllocator;

/// Word frequencies over a fixed text, built with containers bound to
/// `allocator`.
fn word_counts(allocator: &dyn Allocator) -> Vec<(String, u32)> {
    const TEXT: &str = "the quick brown fox jumps over the lazy dog the fox";
    let mut words = Array::<Span<'_, u8>>::new_in(allocator);
    for word in TEXT.split(' ') {
        words.push(Span::from(word)).unwrap();
    }

    let mut counts = Table::<Span<'_, u8>, u32>::new_in(allocator);
    for word in words.iter() {
        *counts.get_or_insert_default(*word).unwrap() += 1;
    }

    let mut out: Vec<(String, u32)> = counts
        .iter()
        .map(|(word, &count)| (String::from_utf8_lossy(word.as_slice()).into_owned(), count))
        .collect();
    out.sort();
    out
}

#[test]
fn word_counts_agree_across_allocators() {
    let expected = word_counts(system());
    assert_eq!(expected.len(), 8);
    assert!(expected.contains(&("the".to_string(), 3)));
    assert!(expected.contains(&("fox".to_string(), 2)));

    let counting = CountingAllocator::new();
    assert_eq!(word_counts(&counting), expected);
    assert_eq!(counting.live_blocks(), 0);

    let arena = Arena::new(64 * 1024, system()).unwrap();
    {
        let scope = LinearAllocator::new(&arena);
        assert_eq!(word_counts(&scope), expected);
        assert!(arena.allocated() > 0);
    }
    assert_eq!(arena.allocated(), 0);
}

#[test]
fn scoped_containers_release_the_arena_tail() {
    let arena = Arena::new(256 * 1024, system()).unwrap();
    let outer = LinearAllocator::new(&arena);
    let mut keep = Array::<u64>::new_in(&outer);
    keep.append_values(0..16).unwrap();
    let mark = arena.allocated();

    {
        let inner = LinearAllocator::new(&arena);
        let mut squares = Table::<u64, u64>::new_in(&inner);
        for key in 0..1_000 {
            squares.update(key, key * key).unwrap();
        }
        assert_eq!(squares[&999], 998_001);

        let mut scratch = Array::<u32>::new_in(&inner);
        scratch.append_values(0..5_000).unwrap();
        assert_eq!(scratch.len(), 5_000);
        assert!(arena.allocated() > mark);
    }
    assert_eq!(arena.allocated(), mark);

    keep.push(16).unwrap();
    assert_eq!(keep.len(), 17);
    assert_eq!(keep[16], 16);
}

#[test]
fn arena_exhaustion_surfaces_as_alloc_error() {
    let arena = Arena::new(256, system()).unwrap();
    let scope = LinearAllocator::new(&arena);
    let mut array = Array::<u64>::new_in(&scope);
    let result = array.append_values(0..1_000);
    assert!(result.is_err());
    // Everything appended before the failure is still readable.
    assert!(array.iter().copied().eq(0..array.len() as u64));
}

#[test]
fn buffer_backed_arena_hosts_a_table() {
    let mut buffer = vec![0u8; 16 * 1024];
    let arena = Arena::from_buffer(&mut buffer).unwrap();
    let scope = LinearAllocator::new(&arena);
    let mut table = Table::<u32, u32>::new_in(&scope);
    for key in 0..100 {
        table.update(key, key + 1).unwrap();
    }
    assert_eq!(table.len(), 100);
    assert_eq!(table.capacity(), 256);
    assert!(table.iter().all(|(&key, &value)| value == key + 1));
}

#[test]
fn owned_copies_outlive_their_source() {
    let copy = {
        let source = String::from("keel");
        OwnedSpan::<u8>::copy_in(source.as_str(), system()).unwrap()
    };
    assert_eq!(copy.as_span(), *b"keel");
    assert_eq!(
        hash_fnv1a(&copy),
        keel_collections::fnv1a_hash(&copy.as_span())
    );
}

#[test]
fn array_of_spans_slices_text() {
    let text = Span::from("alpha,beta,gamma");
    let mut fields = Array::<Span<'_, u8>>::new();
    let mut rest = text;
    while let Some(comma) = rest.position(&b',') {
        fields.push(rest.slice(0, comma)).unwrap();
        rest.advance(comma + 1);
    }
    fields.push(rest).unwrap();

    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0], *b"alpha");
    assert_eq!(fields[1], *b"beta");
    assert_eq!(fields[2], *b"gamma");
}
