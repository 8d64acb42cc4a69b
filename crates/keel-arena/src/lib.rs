//! Bump-allocated arenas and scoped linear allocators for Keel.
//!
//! An [`Arena`] is a single contiguous byte region served front to back.
//! Every block carries a size header in the `usize` immediately before the
//! pointer handed out, which lets the tail block grow or shrink in place.
//! A [`LinearAllocator`] presents an arena through the
//! [`Allocator`](keel_core::Allocator) interface and rewinds the arena to
//! where it found it when dropped.
//!
//! # Layout
//!
//! ```text
//! ┌──────────────┬───────────┬──────┬─────────┬──────┬──────┬─────────┬─────
//! │ ArenaHeader  │ (padding) │ size │ block 0 │ pad  │ size │ block 1 │ free
//! │ cap | alloc  │           │ usize│         │      │ usize│         │
//! └──────────────┴───────────┴──────┴─────────┴──────┴──────┴─────────┴─────
//!                ▲ data                ▲ returned              ▲ data + allocated
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod arena;
pub mod config;
pub mod error;
pub mod linear;

// Public re-exports for the primary API surface.
pub use arena::{Arena, BLOCK_HEADER_SIZE, HEADER_SIZE};
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use linear::LinearAllocator;
