//! The arena allocator over one word buffer.

use faultline_core::{fatal, Allocator, ConfigError, KindId, Ptr, Violation};

use crate::config::{validate_capacity, ArenaConfig};
use crate::node::{block_size, Node, NodeHeader, HEADER_SIZE};

const FRESH_POISON: u8 = 0xCC;
const RELEASED_POISON: u8 = 0xFF;

/// Occupancy summary of an arena, as reported by [`ArenaAllocator::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Number of allocated nodes.
    pub allocated_nodes: usize,
    /// Bytes covered by allocated nodes, headers included.
    pub allocated_bytes: usize,
    /// Number of free nodes, counted before lazy coalescing.
    pub free_nodes: usize,
    /// Bytes covered by free nodes, headers included.
    pub free_bytes: usize,
}

/// A first-fit allocator over a fixed buffer.
///
/// Pointers it returns are payload byte offsets into its own buffer.
/// The instance is `&mut`-exclusive; callers sharing one across threads
/// wrap it in the registry's critical section.
pub struct ArenaAllocator {
    kind: KindId,
    words: Box<[u64]>,
    /// Offset of the node where the next search begins.
    cursor: usize,
    poison: bool,
    live: bool,
}

impl ArenaAllocator {
    /// Kind identity used by arenas built outside a kind.
    pub const DEFAULT_KIND: KindId = KindId("arena");

    /// Create an arena with a freshly allocated buffer of `config.capacity` bytes.
    pub fn new(config: &ArenaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let words = vec![0u64; config.capacity / HEADER_SIZE].into_boxed_slice();
        Self::from_buffer(words, config.poison)
    }

    /// Create an arena over a caller-supplied buffer.
    ///
    /// The buffer size in bytes must be a non-zero multiple of 16. Word
    /// storage guarantees header alignment. Existing contents are ignored.
    pub fn from_buffer(words: Box<[u64]>, poison: bool) -> Result<Self, ConfigError> {
        let bytes = words.len() * HEADER_SIZE;
        validate_capacity(bytes)?;
        let mut arena = Self {
            kind: Self::DEFAULT_KIND,
            words,
            cursor: 0,
            poison,
            live: true,
        };
        if poison {
            arena.bytes_mut().fill(FRESH_POISON);
        }
        arena.write(0, NodeHeader::free(bytes));
        log::debug!(target: "faultline::arena", "created arena of {bytes} bytes");
        Ok(arena)
    }

    /// Report `kind` in diagnostics instead of [`Self::DEFAULT_KIND`].
    pub fn with_kind(mut self, kind: KindId) -> Self {
        self.kind = kind;
        self
    }

    /// Buffer size in bytes.
    pub fn len(&self) -> usize {
        self.words.len() * HEADER_SIZE
    }

    /// Whether the buffer holds no bytes. Never true for an arena built
    /// through [`new`](Self::new) or [`from_buffer`](Self::from_buffer).
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Offset of the node where the next search begins.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The current tiling, in buffer order, without merging free runs.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        let len = self.len();
        let mut offset = 0;
        std::iter::from_fn(move || {
            if offset >= len {
                return None;
            }
            let header = self.header(offset);
            let node = Node {
                offset,
                size: header.size(),
                allocated: header.is_allocated(),
            };
            offset += node.size;
            Some(node)
        })
    }

    /// Count allocated and free nodes.
    pub fn stats(&self) -> ArenaStats {
        self.nodes().fold(ArenaStats::default(), |mut stats, node| {
            if node.allocated {
                stats.allocated_nodes += 1;
                stats.allocated_bytes += node.size;
            } else {
                stats.free_nodes += 1;
                stats.free_bytes += node.size;
            }
            stats
        })
    }

    /// Verify that nodes tile the buffer and the cursor sits on a node.
    pub fn check(&self) -> Result<(), Violation> {
        let len = self.len();
        let mut offset = 0;
        let mut cursor_seen = false;
        while offset < len {
            let raw = self.words[offset / HEADER_SIZE];
            let size = NodeHeader(raw).size();
            if size < HEADER_SIZE || size % HEADER_SIZE != 0 || size > len - offset {
                return Err(Violation::CorruptHeader { offset, raw });
            }
            cursor_seen |= offset == self.cursor;
            offset += size;
        }
        if !cursor_seen {
            let raw = self.words.get(self.cursor / HEADER_SIZE).copied().unwrap_or(0);
            return Err(Violation::CorruptHeader {
                offset: self.cursor,
                raw,
            });
        }
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.words)
    }

    fn write(&mut self, offset: usize, header: NodeHeader) {
        self.words[offset / HEADER_SIZE] = header.0;
    }

    /// Read the header at `offset`, failing hard if it cannot tile the buffer.
    fn header(&self, offset: usize) -> NodeHeader {
        let header = NodeHeader(self.words[offset / HEADER_SIZE]);
        let size = header.size();
        if size < HEADER_SIZE || size % HEADER_SIZE != 0 || size > self.len() - offset {
            fatal(Violation::CorruptHeader {
                offset,
                raw: header.0,
            });
        }
        header
    }

    /// Offset of the node after the one at `offset`, wrapping at the end.
    fn successor(&self, offset: usize, size: usize) -> usize {
        let next = offset + size;
        if next == self.len() {
            0
        } else {
            next
        }
    }

    /// Size of the node at `offset` plus every free node directly after it,
    /// stopping at the end of the buffer.
    fn free_run(&self, offset: usize, size: usize) -> usize {
        let end = self.len();
        let mut run = size;
        while offset + run != end {
            let next = self.header(offset + run);
            if next.is_allocated() {
                break;
            }
            run += next.size();
        }
        run
    }

    /// Merge the free node at `offset` with its free successors.
    ///
    /// Keeps the cursor on a node boundary when the merge swallows it.
    fn coalesce(&mut self, offset: usize, size: usize) -> usize {
        let merged = self.free_run(offset, size);
        if merged != size {
            self.write(offset, NodeHeader::free(merged));
            let next = offset + merged;
            if offset < self.cursor && self.cursor < next {
                self.cursor = if next == self.len() { 0 } else { next };
            }
            log::trace!(target: "faultline::arena", "coalesced {size} -> {merged} at {offset}");
        }
        merged
    }

    /// Hand out `need` bytes from the front of the free node at `offset`.
    fn allocate_node(&mut self, offset: usize, need: usize) -> Option<Ptr> {
        let size = self.header(offset).size();
        debug_assert!(need <= size);
        if need < size {
            // The remainder may be a bare header; a later merge reclaims it.
            self.write(offset, NodeHeader::allocated(need));
            self.write(offset + need, NodeHeader::free(size - need));
        } else {
            self.write(offset, NodeHeader::allocated(size));
        }
        self.cursor = offset;
        Ptr::new((offset + HEADER_SIZE) as u64)
    }

    /// Node offset for a payload pointer, with bounds and alignment checks.
    fn node_of(&self, p: Ptr) -> usize {
        let addr = p.addr();
        let len = self.len();
        if addr < HEADER_SIZE as u64 || addr > len as u64 {
            fatal(Violation::OutOfBounds { ptr: p, len });
        }
        if addr % HEADER_SIZE as u64 != 0 {
            fatal(Violation::MisalignedPointer { ptr: p });
        }
        let offset = addr as usize - HEADER_SIZE;
        // Payload bytes can mimic a header; only a node boundary is a block.
        if cfg!(debug_assertions)
            && !self
                .nodes()
                .take_while(|node| node.offset <= offset)
                .any(|node| node.offset == offset)
        {
            fatal(Violation::UnknownPointer { ptr: p });
        }
        offset
    }

    /// Offset and size of the allocated node behind `p`, or `None` if free.
    fn allocated_node(&self, p: Ptr) -> Option<(usize, usize)> {
        let offset = self.node_of(p);
        let header = self.header(offset);
        header.is_allocated().then_some((offset, header.size()))
    }

    fn ensure_live(&self) {
        if !self.live {
            fatal(Violation::DestroyedAllocator { kind: self.kind });
        }
    }
}

impl Allocator for ArenaAllocator {
    fn grab(&mut self, n: usize) -> Option<Ptr> {
        self.ensure_live();
        let len = self.len();
        let need = match block_size(n) {
            Some(need) if need <= len => need,
            _ => {
                log::trace!(target: "faultline::arena", "grab({n}): larger than buffer");
                return None;
            }
        };
        let mut offset = self.cursor;
        let mut walked = 0;
        // One full circle from the cursor; merges can only lengthen a step.
        while walked < len {
            let header = self.header(offset);
            let mut size = header.size();
            if !header.is_allocated() {
                size = self.coalesce(offset, size);
                if need <= size {
                    let p = self.allocate_node(offset, need);
                    log::trace!(target: "faultline::arena", "grab({n}) -> node {offset}");
                    return p;
                }
            }
            walked += size;
            offset = self.successor(offset, size);
        }
        log::trace!(target: "faultline::arena", "grab({n}): no free run of {need} bytes");
        None
    }

    fn release(&mut self, p: Ptr) {
        self.ensure_live();
        let Some((offset, size)) = self.allocated_node(p) else {
            fatal(Violation::DoubleRelease { ptr: p });
        };
        self.write(offset, NodeHeader::free(size));
        if self.poison {
            self.bytes_mut()[offset + HEADER_SIZE..offset + size].fill(RELEASED_POISON);
        }
        if offset < self.cursor {
            self.cursor = offset;
        }
        log::trace!(target: "faultline::arena", "release node {offset} ({size} bytes)");
    }

    fn resize(&mut self, p: Ptr, n: usize) -> Option<Ptr> {
        self.ensure_live();
        let Some((offset, size)) = self.allocated_node(p) else {
            fatal(Violation::DoubleRelease { ptr: p });
        };
        let available = self.free_run(offset, size);
        if let Some(need) = block_size(n).filter(|&need| need <= available) {
            self.write(offset, NodeHeader::free(available));
            log::trace!(target: "faultline::arena", "resize({n}) in place at node {offset}");
            return self.allocate_node(offset, need);
        }

        let q = self.grab(n)?;
        let old = p.addr() as usize;
        let count = (size - HEADER_SIZE).min(n);
        self.bytes_mut()
            .copy_within(old..old + count, q.addr() as usize);
        self.release(p);
        log::trace!(target: "faultline::arena", "resize({n}) moved node {offset} to {q}");
        Some(q)
    }

    fn payload(&self, p: Ptr) -> &[u8] {
        self.ensure_live();
        let Some((offset, size)) = self.allocated_node(p) else {
            fatal(Violation::UseAfterRelease { ptr: p });
        };
        &self.bytes()[offset + HEADER_SIZE..offset + size]
    }

    fn payload_mut(&mut self, p: Ptr) -> &mut [u8] {
        self.ensure_live();
        let Some((offset, size)) = self.allocated_node(p) else {
            fatal(Violation::UseAfterRelease { ptr: p });
        };
        &mut self.bytes_mut()[offset + HEADER_SIZE..offset + size]
    }

    fn teardown(&mut self) {
        if !self.live {
            return;
        }
        if self.poison {
            self.bytes_mut().fill(RELEASED_POISON);
        }
        self.live = false;
        log::debug!(target: "faultline::arena", "destroyed arena '{}'", self.kind);
    }
}
