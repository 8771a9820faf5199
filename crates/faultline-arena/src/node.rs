//! Node headers and block-size rounding.

/// Size of a node header in bytes. Also the node alignment.
pub const HEADER_SIZE: usize = 8;

/// Smallest block `grab` ever carves out: a header plus one word.
pub const MIN_BLOCK: usize = 2 * HEADER_SIZE;

const ALLOCATED: u64 = 1;

/// Packed header word: block size in bytes with the allocated flag in bit 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeHeader(pub(crate) u64);

impl NodeHeader {
    pub(crate) fn free(size: usize) -> Self {
        Self(size as u64)
    }

    pub(crate) fn allocated(size: usize) -> Self {
        Self(size as u64 | ALLOCATED)
    }

    /// Block size including the header.
    pub(crate) fn size(self) -> usize {
        (self.0 & !ALLOCATED) as usize
    }

    pub(crate) fn is_allocated(self) -> bool {
        self.0 & ALLOCATED != 0
    }
}

/// One node of the tiling, as reported by [`ArenaAllocator::nodes`].
///
/// [`ArenaAllocator::nodes`]: crate::ArenaAllocator::nodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    /// Byte offset of the header within the buffer.
    pub offset: usize,
    /// Block size in bytes, header included.
    pub size: usize,
    /// Whether the block is handed out.
    pub allocated: bool,
}

/// Block size needed to serve a request for `n` payload bytes.
///
/// At least [`MIN_BLOCK`]; otherwise a header plus `n` rounded up to the
/// next multiple of 8. `None` if the size overflows.
pub(crate) fn block_size(n: usize) -> Option<usize> {
    if n < HEADER_SIZE {
        return Some(MIN_BLOCK);
    }
    let payload = n.checked_add(HEADER_SIZE - 1)? & !(HEADER_SIZE - 1);
    payload.checked_add(HEADER_SIZE)
}
