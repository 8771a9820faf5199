//! Test utilities for Faultline development.
//!
//! Provides the [`FaultyAllocator`], whose grab and resize consult the
//! replay engine before reaching the heap, and [`TEST_FIXTURE`], which
//! routes a thread's default allocator to it. Wrapping ordinary
//! allocation code in `repeat_test` under this fixture drives it through
//! every allocation failure path.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod faulty;

pub use faulty::{get_faulty_allocator, FaultyAllocator, FaultyKind, FAULTY, TEST_FIXTURE};

/// Route `log` output through the test harness. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
