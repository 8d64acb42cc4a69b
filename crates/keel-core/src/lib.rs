//! Allocator interface and memory helpers for the Keel foundation library.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! [`Allocator`] capability every Keel container is parameterised over,
//! the process-wide [`SystemAllocator`] singleton, alignment helpers, and
//! the [`AllocError`] type surfaced when an allocation cannot be satisfied.
//!
//! # Allocator polymorphism
//!
//! ```text
//! &'a dyn Allocator  (vtable: alloc / realloc / free  +  self pointer)
//! ├── SystemAllocator   → C heap (malloc / realloc / free)
//! └── LinearAllocator   → Arena (keel-arena), free is a no-op
//! ```
//!
//! Containers store the trait object and call back into it from every
//! mutating operation and from `Drop`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod align;
pub mod alloc;
pub mod error;
pub mod system;

pub use align::{align_up, alignptr, min_align_of, nextpow2, MAX_ALIGN};
pub use alloc::{alloc_value, free_value, Allocator};
pub use error::AllocError;
pub use system::{system, SystemAllocator, SYSTEM};
