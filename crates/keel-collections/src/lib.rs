//! Allocator-aware containers for the Keel foundation library.
//!
//! Every owning container binds to a `&dyn Allocator` at construction and
//! routes all growth and teardown through it, so the same code runs on the
//! system heap, on an arena scope, or on an instrumented test allocator.
//!
//! # Containers
//!
//! ```text
//! Span<'a, T> / SpanMut<'a, T>    non-owning {data, count} views
//! OwnedSpan<'a, T>                fixed-size buffer from an allocator
//! Array<'a, T>                    growable buffer, power-of-two growth
//! Table<'a, K, V>                 open addressing, quadratic probing,
//!                                 70% load factor, 64-bit signatures
//! ```
//!
//! # Element types
//!
//! Owning containers store `Copy` types only. They move elements with
//! byte copies and never run destructors on removal, clear or drop; only
//! the raw buffer is released.
//!
//! # Pointer stability
//!
//! Any operation that may reallocate (array growth, table insertion past
//! the load factor, `expand`) moves every element. The borrow checker
//! enforces this: references into a container cannot outlive a call that
//! takes `&mut self`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod array;
pub mod hash;
pub mod owned;
mod raw;
pub mod span;
pub mod table;

// Public re-exports for the primary API surface.
pub use array::Array;
pub use hash::{fnv1a_bytes, fnv1a_hash, hash_fnv1a, Fnv1aBuildHasher, Fnv1aHasher, HashFn};
pub use owned::OwnedSpan;
pub use span::{Span, SpanMut};
pub use table::Table;
