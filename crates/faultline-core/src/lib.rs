//! Core types and traits for the Faultline allocator toolkit.
//!
//! This is the leaf crate of the workspace. It defines the vocabulary
//! shared by every allocator kind: opaque pointers, kind identities,
//! the [`Allocator`] and [`AllocatorKind`] capability traits, error
//! types, the process-wide critical section, and the priority-ordered
//! exit-handler table used for allocator teardown.
//!
//! The only `unsafe` in the crate is the single `atexit` registration
//! in [`exit`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod critical;
pub mod error;
pub mod exit;
pub mod id;
pub mod traits;

pub use error::{fatal, ConfigError, Violation};
pub use id::{KindId, Ptr};
pub use traits::{Allocator, AllocatorKind};
