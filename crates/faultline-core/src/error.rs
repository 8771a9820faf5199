//! Error types for allocator setup and invariant violations.
//!
//! Two families, matching the two ways things go wrong:
//!
//! - [`ConfigError`] is returned from constructors. Setup code decides
//!   whether to abort.
//! - [`Violation`] names a broken invariant. Allocation paths never
//!   return it; they pass it straight to [`fatal`], which logs it and
//!   panics. Consistency checks may return it for inspection.
//!
//! Running out of memory is neither: it is an ordinary `None`.

use std::error::Error;
use std::fmt;

use crate::id::{KindId, Ptr};

/// Errors detected while building an allocator instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The arena buffer cannot hold even a single minimum-size node.
    BufferTooSmall {
        /// Size of the supplied buffer in bytes.
        bytes: usize,
        /// Smallest acceptable size in bytes.
        minimum: usize,
    },
    /// The arena buffer size is not a multiple of 16 bytes.
    BufferNotMultipleOf16 {
        /// Size of the supplied buffer in bytes.
        bytes: usize,
    },
    /// A kind's `create` could not initialise its instance.
    KindCreateFailed {
        /// The kind that failed.
        kind: KindId,
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall { bytes, minimum } => {
                write!(f, "buffer too small: {bytes} bytes, minimum {minimum}")
            }
            Self::BufferNotMultipleOf16 { bytes } => {
                write!(f, "buffer size {bytes} is not a multiple of 16")
            }
            Self::KindCreateFailed { kind, reason } => {
                write!(f, "cannot create allocator '{kind}': {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// A broken allocator or replay invariant.
///
/// Each variant corresponds to a caller bug. See [`fatal`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    /// Released or resized a block that is not currently allocated.
    DoubleRelease {
        /// The offending pointer.
        ptr: Ptr,
    },
    /// Accessed the payload of a block that is not currently allocated.
    UseAfterRelease {
        /// The offending pointer.
        ptr: Ptr,
    },
    /// A node header holds a size that cannot tile the buffer.
    CorruptHeader {
        /// Byte offset of the header.
        offset: usize,
        /// Raw header word.
        raw: u64,
    },
    /// A pointer lies outside the owning buffer.
    OutOfBounds {
        /// The offending pointer.
        ptr: Ptr,
        /// Length of the owning buffer in bytes.
        len: usize,
    },
    /// A pointer is not aligned to the node header size.
    MisalignedPointer {
        /// The offending pointer.
        ptr: Ptr,
    },
    /// A pointer was never issued by this allocator.
    UnknownPointer {
        /// The offending pointer.
        ptr: Ptr,
    },
    /// Instrumented code passed more checkpoints than a replay frame records.
    CheckpointOverflow {
        /// The fixed checkpoint bound.
        limit: usize,
    },
    /// An allocator instance was used after registry teardown.
    DestroyedAllocator {
        /// Kind of the destroyed instance.
        kind: KindId,
    },
    /// An allocator instance was called again from inside one of its own
    /// operations, for example from a payload closure.
    ReentrantUse {
        /// Kind of the busy instance.
        kind: KindId,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoubleRelease { ptr } => {
                write!(f, "double release of block {ptr}")
            }
            Self::UseAfterRelease { ptr } => {
                write!(f, "use of released block {ptr}")
            }
            Self::CorruptHeader { offset, raw } => {
                write!(f, "corrupted node header at offset {offset}: {raw:#018x}")
            }
            Self::OutOfBounds { ptr, len } => {
                write!(f, "pointer {ptr} outside buffer of {len} bytes")
            }
            Self::MisalignedPointer { ptr } => {
                write!(f, "pointer {ptr} is not header-aligned")
            }
            Self::UnknownPointer { ptr } => {
                write!(f, "pointer {ptr} was not issued by this allocator")
            }
            Self::CheckpointOverflow { limit } => {
                write!(f, "too many allocation requests: more than {limit} checkpoints")
            }
            Self::DestroyedAllocator { kind } => {
                write!(f, "allocator '{kind}' used after teardown")
            }
            Self::ReentrantUse { kind } => {
                write!(f, "allocator '{kind}' re-entered while busy")
            }
        }
    }
}

impl Error for Violation {}

/// Abort the current operation on a broken invariant.
///
/// Logs the violation at `error` level, then panics with its message.
#[cold]
#[track_caller]
pub fn fatal(violation: Violation) -> ! {
    log::error!(target: "faultline", "{violation}");
    panic!("{violation}");
}
