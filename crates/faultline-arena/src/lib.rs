//! Fixed-buffer arena allocator for Faultline.
//!
//! One [`ArenaAllocator`] owns exactly one buffer of 8-byte words and
//! carves it into variable-size blocks. Every block starts with a
//! one-word header packing the block size (header included) with an
//! allocated flag in bit 0.
//!
//! # Layout
//!
//! ```text
//! offset 0                                                   len
//! ┌────────┬─────────────┬────────┬──────┬────────┬──────────┐
//! │ hdr|1  │  payload    │ hdr|0  │ free │ hdr|1  │ payload  │
//! └────────┴─────────────┴────────┴──────┴────────┴──────────┘
//!   allocated               free             allocated
//! ```
//!
//! Nodes tile the buffer end to end with no gaps. The buffer is walked
//! as a circle starting from a cursor that follows recent activity.
//!
//! # Coalescing
//!
//! Releasing only clears the allocated bit. Adjacent free nodes are
//! merged lazily, the next time a `grab` or `resize` scan reaches them.
//!
//! No `unsafe` is used: payload byte views are produced from the word
//! buffer with `bytemuck`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod config;
pub mod kind;
pub mod node;

pub use arena::{ArenaAllocator, ArenaStats};
pub use config::ArenaConfig;
pub use kind::{ArenaKind, ARENA};
pub use node::Node;
