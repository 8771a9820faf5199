//! The allocator capability traits.
//!
//! An allocator *kind* is a value implementing [`AllocatorKind`]; each
//! kind builds [`Allocator`] instances. Every capability is a required
//! method, so a partially-populated kind does not compile.

use crate::error::ConfigError;
use crate::id::{KindId, Ptr};

/// Behaviour of one live allocator instance.
///
/// Recoverable exhaustion is reported as `None`. Structural misuse
/// (double release, foreign or corrupted pointers) is fatal and panics
/// through [`fatal`](crate::fatal).
pub trait Allocator: Send {
    /// Allocate a block of at least `n` payload bytes.
    ///
    /// Returns `None` when no sufficiently large block is available.
    fn grab(&mut self, n: usize) -> Option<Ptr>;

    /// Return a live block to the allocator.
    fn release(&mut self, p: Ptr);

    /// Resize a live block to at least `n` payload bytes.
    ///
    /// May move the block. On `None` the original block and its
    /// contents are untouched and still owned by the caller.
    fn resize(&mut self, p: Ptr, n: usize) -> Option<Ptr>;

    /// The payload bytes of a live block.
    ///
    /// The slice may be longer than the size last requested for the
    /// block, never shorter.
    fn payload(&self, p: Ptr) -> &[u8];

    /// Mutable payload bytes of a live block.
    fn payload_mut(&mut self, p: Ptr) -> &mut [u8];

    /// Destroy the instance's state before it is dropped.
    ///
    /// Called exactly once by the registry at teardown. Blocks still
    /// live at this point are considered leaked.
    fn teardown(&mut self);
}

/// A kind of allocator: a factory for [`Allocator`] instances.
///
/// Kinds are plain values, usually `static` items, handed around as
/// `&'static dyn AllocatorKind`.
pub trait AllocatorKind: Send + Sync + 'static {
    /// Registry identity of this kind.
    fn id(&self) -> KindId;

    /// Human-readable name for diagnostics.
    fn name(&self) -> &'static str {
        self.id().0
    }

    /// Build and initialise a fresh instance.
    ///
    /// A failed create leaves nothing behind.
    fn create(&self) -> Result<Box<dyn Allocator>, ConfigError>;
}
