//! Faultline: pluggable allocators and exhaustive out-of-memory testing.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Faultline sub-crates. For most users, adding `faultline` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use faultline::prelude::*;
//!
//! // Code under test: allocates through the thread's default allocator.
//! fn build_pair() -> bool {
//!     let Some(a) = memory::allocate(32) else { return false };
//!     let Some(b) = memory::allocate(64) else {
//!         memory::free(Some(a));
//!         return false;
//!     };
//!     memory::free(Some(b));
//!     memory::free(Some(a));
//!     true
//! }
//!
//! let _fixture = use_fixture(TEST_FIXTURE);
//! let outcome = repeat_test_with_stats(build_pair);
//! assert!(outcome.result);
//! // Fails at the first allocation, then the second, then succeeds.
//! assert_eq!(outcome.runs, 3);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `faultline-core` | `Ptr`, `KindId`, allocator traits, errors, critical section, exit handlers |
//! | [`arena`] | `faultline-arena` | Fixed-buffer arena allocator and its kinds |
//! | [`replay`] | `faultline-replay` | `simulate_failure` and the `repeat_test` loop |
//! | [`registry`] | `faultline-registry` | Allocator registry, system allocator, fixtures, `memory` |
//! | [`testing`] | `faultline-test-utils` | Faulty allocator and the test fixture |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and errors (`faultline-core`).
pub use faultline_core as types;

/// The fixed-buffer arena allocator (`faultline-arena`).
///
/// [`arena::ARENA`] is the default 1 MiB kind; build others with
/// [`arena::ArenaKind::new`].
pub use faultline_arena as arena;

/// Fault-injection replay (`faultline-replay`).
pub use faultline_replay as replay;

/// Allocator registry and fixtures (`faultline-registry`).
pub use faultline_registry as registry;

/// Faulty allocator and test fixture (`faultline-test-utils`).
pub use faultline_test_utils as testing;

/// Common imports for typical Faultline usage.
pub mod prelude {
    // Core types and traits
    pub use faultline_core::{Allocator, AllocatorKind, ConfigError, KindId, Ptr, Violation};

    // Allocators
    pub use faultline_arena::{ArenaAllocator, ArenaConfig, ArenaKind, ARENA};
    pub use faultline_registry::{
        get_allocator, memory, AllocatorRef, Registry, SystemAllocator, SYSTEM,
    };

    // Fixtures
    pub use faultline_registry::{current_fixture, set_fixture, use_fixture, Fixture, DEFAULT_FIXTURE};
    pub use faultline_test_utils::{FaultyAllocator, FAULTY, TEST_FIXTURE};

    // Replay
    pub use faultline_replay::{repeat_test, repeat_test_with_stats, simulate_failure, ReplayOutcome};
}
