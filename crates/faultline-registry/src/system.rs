//! The system allocator: heap-backed blocks behind slot+generation handles.
//!
//! Each block is an owned `Vec<u8>`. Released handles carry a stale
//! generation, so releasing twice is detected instead of corrupting a
//! reused slot.

use faultline_core::{fatal, Allocator, AllocatorKind, ConfigError, KindId, Ptr, Violation};

/// Handle encoding: upper 32 bits = slot index + 1, lower 32 bits = generation.
fn encode(slot: u32, generation: u32) -> Option<Ptr> {
    Ptr::new(((slot as u64 + 1) << 32) | generation as u64)
}

fn decode(p: Ptr) -> Option<(usize, u32)> {
    let slot = (p.addr() >> 32).checked_sub(1)?;
    Some((slot as usize, p.addr() as u32))
}

struct Slot {
    generation: u32,
    block: Option<Vec<u8>>,
}

/// An allocator drawing every block from the process heap.
///
/// Exhaustion is reported as `None`: a request the heap cannot satisfy
/// returns `None` from `grab`, and from `resize` with the block left as
/// it was. `resize` keeps the handle and grows or shrinks the block in
/// place.
#[derive(Default)]
pub struct SystemAllocator {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    live: usize,
}

impl SystemAllocator {
    /// Create an allocator with no blocks.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Number of blocks handed out and not yet released.
    pub fn live_blocks(&self) -> usize {
        self.live
    }

    fn block(&self, p: Ptr) -> Option<&Vec<u8>> {
        let (slot_idx, generation) = decode(p)?;
        let slot = self.slots.get(slot_idx)?;
        if slot.generation != generation {
            return None;
        }
        slot.block.as_ref()
    }

    fn block_mut(&mut self, p: Ptr) -> Option<&mut Vec<u8>> {
        let (slot_idx, generation) = decode(p)?;
        let slot = self.slots.get_mut(slot_idx)?;
        if slot.generation != generation {
            return None;
        }
        slot.block.as_mut()
    }

    /// The violation for a handle that does not name a live block.
    fn misuse(&self, p: Ptr) -> Violation {
        match decode(p) {
            Some((slot_idx, _)) if slot_idx < self.slots.len() => Violation::DoubleRelease { ptr: p },
            _ => Violation::UnknownPointer { ptr: p },
        }
    }
}

impl Allocator for SystemAllocator {
    fn grab(&mut self, n: usize) -> Option<Ptr> {
        let mut block = Vec::new();
        if block.try_reserve_exact(n).is_err() {
            log::debug!(target: "faultline::system", "grab({n}): heap exhausted");
            return None;
        }
        block.resize(n, 0);
        self.live += 1;
        if let Some(slot_idx) = self.free_list.pop() {
            let slot = &mut self.slots[slot_idx as usize];
            slot.block = Some(block);
            encode(slot_idx, slot.generation)
        } else {
            let slot_idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                block: Some(block),
            });
            encode(slot_idx, 0)
        }
    }

    fn release(&mut self, p: Ptr) {
        let Some((slot_idx, generation)) = decode(p) else {
            fatal(Violation::UnknownPointer { ptr: p });
        };
        let released = match self.slots.get_mut(slot_idx) {
            Some(slot) if slot.generation == generation && slot.block.is_some() => {
                slot.block = None;
                slot.generation = slot.generation.wrapping_add(1);
                // A wrapped generation would collide with stale handles; retire the slot.
                if slot.generation != 0 {
                    self.free_list.push(slot_idx as u32);
                }
                true
            }
            _ => false,
        };
        if !released {
            fatal(self.misuse(p));
        }
        self.live -= 1;
    }

    fn resize(&mut self, p: Ptr, n: usize) -> Option<Ptr> {
        match self.block_mut(p) {
            Some(block) => {
                if block.try_reserve_exact(n.saturating_sub(block.len())).is_err() {
                    log::debug!(target: "faultline::system", "resize({p}, {n}): heap exhausted");
                    return None;
                }
                block.resize(n, 0);
                Some(p)
            }
            None => fatal(self.misuse(p)),
        }
    }

    fn payload(&self, p: Ptr) -> &[u8] {
        match self.block(p) {
            Some(block) => block,
            None => fatal(Violation::UseAfterRelease { ptr: p }),
        }
    }

    fn payload_mut(&mut self, p: Ptr) -> &mut [u8] {
        match self.block_mut(p) {
            Some(block) => block,
            None => fatal(Violation::UseAfterRelease { ptr: p }),
        }
    }

    fn teardown(&mut self) {
        if self.live > 0 {
            log::warn!(target: "faultline::system", "{} blocks leaked at teardown", self.live);
        }
        self.slots.clear();
        self.free_list.clear();
        self.live = 0;
    }
}

/// Kind of [`SystemAllocator`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemKind;

/// The system allocator kind. Backs the default fixture.
pub static SYSTEM: SystemKind = SystemKind;

impl AllocatorKind for SystemKind {
    fn id(&self) -> KindId {
        KindId("system")
    }

    fn create(&self) -> Result<Box<dyn Allocator>, ConfigError> {
        Ok(Box::new(SystemAllocator::new()))
    }
}
