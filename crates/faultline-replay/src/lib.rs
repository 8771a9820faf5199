//! Fault-injection replay for Faultline.
//!
//! Instrumented code calls [`simulate_failure`] at every point where a
//! resource request could fail. [`repeat_test`] runs a test callback
//! over and over, each time forcing a different pattern of checkpoints
//! to fail, until a run completes without any forced failure. Every
//! error-handling branch reachable through checkpoints is exercised
//! without changing the code under test.
//!
//! # Architecture
//!
//! - [`FailureReplayFrame`] is the pure state machine: a bit per
//!   checkpoint index saying whether that checkpoint fails this run.
//! - Each thread has its own active-frame slot. [`repeat_test`] installs
//!   a fresh frame there and restores the caller's frame on exit, so
//!   nested and concurrent replays stay independent.
//! - Outside any replay, [`simulate_failure`] always returns `false`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod frame;

pub use engine::{is_replay_active, repeat_test, repeat_test_with_stats, simulate_failure, ReplayOutcome};
pub use frame::{FailureReplayFrame, MAX_CHECKPOINTS};
