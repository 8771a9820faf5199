//! Workload generators shared by the Faultline benchmarks.
//!
//! - [`churn_plan`]: a deterministic mix of grab, resize and release
//!   requests driven by a seed
//! - [`run_plan`]: replays a plan against any [`Allocator`]

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use faultline_core::{Allocator, Ptr};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// One request in a churn workload. Slots index a table of live blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Allocate `bytes` into `slot`, releasing whatever it held.
    Grab {
        /// Target slot.
        slot: usize,
        /// Requested payload size.
        bytes: usize,
    },
    /// Resize the block in `slot` to `bytes`.
    Resize {
        /// Target slot.
        slot: usize,
        /// New payload size.
        bytes: usize,
    },
    /// Release the block in `slot`.
    Release {
        /// Target slot.
        slot: usize,
    },
}

/// Build `len` requests over `slots` slots with payloads below `max_bytes`.
///
/// Same seed, same plan.
pub fn churn_plan(seed: u64, len: usize, slots: usize, max_bytes: usize) -> Vec<Op> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let slots = slots.max(1) as u64;
    let max_bytes = max_bytes.max(1) as u64;
    (0..len)
        .map(|_| {
            let slot = (rng.next_u64() % slots) as usize;
            let bytes = 1 + (rng.next_u64() % max_bytes) as usize;
            match rng.next_u32() % 4 {
                0 | 1 => Op::Grab { slot, bytes },
                2 => Op::Resize { slot, bytes },
                _ => Op::Release { slot },
            }
        })
        .collect()
}

/// Apply `plan` to `allocator`, then release everything still live.
///
/// Returns how many requests the allocator refused.
pub fn run_plan(allocator: &mut dyn Allocator, plan: &[Op], slots: usize) -> usize {
    drive(allocator, plan, slots, false)
}

/// Like [`run_plan`], but stops at the first refused request.
///
/// Returns `true` if every request succeeded. Under a replay loop this
/// keeps the run count linear in the number of checkpoints.
pub fn try_run_plan(allocator: &mut dyn Allocator, plan: &[Op], slots: usize) -> bool {
    drive(allocator, plan, slots, true) == 0
}

fn drive(allocator: &mut dyn Allocator, plan: &[Op], slots: usize, stop_on_refusal: bool) -> usize {
    let mut live: Vec<Option<Ptr>> = vec![None; slots.max(1)];
    let mut refused = 0;
    for op in plan {
        match *op {
            Op::Grab { slot, bytes } => {
                if let Some(old) = live[slot].take() {
                    allocator.release(old);
                }
                live[slot] = allocator.grab(bytes);
                refused += usize::from(live[slot].is_none());
            }
            Op::Resize { slot, bytes } => {
                if let Some(old) = live[slot] {
                    match allocator.resize(old, bytes) {
                        Some(p) => live[slot] = Some(p),
                        None => refused += 1,
                    }
                }
            }
            Op::Release { slot } => {
                if let Some(old) = live[slot].take() {
                    allocator.release(old);
                }
            }
        }
        if stop_on_refusal && refused > 0 {
            break;
        }
    }
    for p in live.into_iter().flatten() {
        allocator.release(p);
    }
    refused
}
