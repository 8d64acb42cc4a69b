//! Keel: allocator-aware building blocks for systems code.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Keel sub-crates. For most users, adding `keel` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use keel::prelude::*;
//!
//! // A 4 KiB arena carved out of the system heap.
//! let arena = Arena::new(4096, system()).unwrap();
//!
//! {
//!     // Everything allocated through `scope` is released when it drops.
//!     let scope = LinearAllocator::new(&arena);
//!
//!     let mut ids = Array::<u32>::new_in(&scope);
//!     ids.append_values([7, 11, 13]).unwrap();
//!
//!     let mut names = Table::<Span<'_, u8>, u32>::new_in(&scope);
//!     names.update(Span::from("seven"), ids[0]).unwrap();
//!     assert_eq!(names.find(&Span::from("seven")), Some(&7));
//!     assert!(arena.allocated() > 0);
//! }
//!
//! assert_eq!(arena.allocated(), 0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for items not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`alloc`] | `keel-core` | `Allocator` trait, system heap, alignment helpers |
//! | [`arena`] | `keel-arena` | `Arena`, `LinearAllocator`, arena configuration |
//! | [`collections`] | `keel-collections` | `Span`, `OwnedSpan`, `Array`, `Table`, FNV-1a |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// The allocator interface and the system heap (`keel-core`).
///
/// Implement [`alloc::Allocator`] to plug a custom memory source into every
/// container. [`alloc::system`] returns the process-wide heap allocator.
pub use keel_core as alloc;

/// Bump-allocated regions (`keel-arena`).
///
/// [`arena::Arena`] owns one contiguous region; [`arena::LinearAllocator`]
/// opens a scope on it that rewinds when dropped.
pub use keel_arena as arena;

/// Spans, arrays and hash tables (`keel-collections`).
pub use keel_collections as collections;

/// Common imports for typical Keel usage.
///
/// ```rust
/// use keel::prelude::*;
/// ```
pub mod prelude {
    // Allocation
    pub use keel_core::{system, AllocError, Allocator, MAX_ALIGN};

    // Arenas
    pub use keel_arena::{Arena, ArenaConfig, ArenaError, LinearAllocator};

    // Containers
    pub use keel_collections::{Array, OwnedSpan, Span, SpanMut, Table};
}
