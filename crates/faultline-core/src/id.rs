//! Strongly-typed identifiers: [`KindId`] and the opaque [`Ptr`].

use std::fmt;
use std::num::NonZeroU64;

/// Stable identity of an allocator kind.
///
/// The registry keys its singleton instances by this value. Two kinds
/// reporting the same `KindId` share one registry entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KindId(pub &'static str);

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl From<&'static str> for KindId {
    fn from(v: &'static str) -> Self {
        Self(v)
    }
}

/// Opaque address of a live block, as handed out by an allocator.
///
/// A `Ptr` is never null: "no block" is spelled `Option<Ptr>::None`.
/// Its numeric value is meaningful only to the allocator that issued it
/// (a payload offset for the arena, a slot handle for the system heap);
/// payload bytes are always reached through that allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ptr(NonZeroU64);

impl Ptr {
    /// Wrap a raw address. Returns `None` for zero.
    pub const fn new(addr: u64) -> Option<Self> {
        match NonZeroU64::new(addr) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// The raw address value.
    pub const fn addr(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Ptr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}
