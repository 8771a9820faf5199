//! Allocator registry and fixtures for Faultline.
//!
//! - [`Registry`] caches one instance per allocator kind and tears them
//!   down newest first at process exit.
//! - [`AllocatorRef`] is the shared handle through which instances are
//!   used, always inside the process-wide critical section.
//! - [`SystemAllocator`] draws blocks from the process heap and backs
//!   [`DEFAULT_FIXTURE`].
//! - [`fixture`] selects, per thread, which kind plain allocation uses;
//!   [`memory`] allocates through that selection.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod fixture;
pub mod memory;
pub mod registry;
pub mod system;

pub use fixture::{
    current_fixture, default_allocator, set_fixture, use_fixture, Fixture, FixtureGuard,
    DEFAULT_FIXTURE,
};
pub use registry::{get_allocator, AllocatorRef, Registry};
pub use system::{SystemAllocator, SystemKind, SYSTEM};
