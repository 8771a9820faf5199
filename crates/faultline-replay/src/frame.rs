//! The per-replay failure bit vector.

use faultline_core::{fatal, Violation};

/// Fixed number of checkpoints one run may pass.
pub const MAX_CHECKPOINTS: usize = 1024;

const WORD_BITS: usize = u64::BITS as usize;
const WORDS: usize = MAX_CHECKPOINTS / WORD_BITS;

/// State of one replay loop.
///
/// Bit `i` decides whether checkpoint `i` of the current run reports a
/// failure. A fresh frame has every bit set, so the first run fails at
/// its first checkpoint and at every later one it reaches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureReplayFrame {
    triggered: bool,
    count: usize,
    bits: [u64; WORDS],
}

impl FailureReplayFrame {
    /// A frame forcing every checkpoint to fail.
    pub fn new() -> Self {
        Self {
            triggered: false,
            count: 0,
            bits: [u64::MAX; WORDS],
        }
    }

    /// Start a new run: no checkpoints passed, nothing triggered.
    pub fn reset_run(&mut self) {
        self.triggered = false;
        self.count = 0;
    }

    /// Pass the next checkpoint. Returns `true` if it must fail.
    ///
    /// Passing more than [`MAX_CHECKPOINTS`] in one run is fatal.
    pub fn checkpoint(&mut self) -> bool {
        if self.count >= MAX_CHECKPOINTS {
            fatal(Violation::CheckpointOverflow {
                limit: MAX_CHECKPOINTS,
            });
        }
        let fail = self.bit(self.count);
        self.count += 1;
        if fail {
            self.triggered = true;
        }
        fail
    }

    /// Whether any checkpoint failed in the current run.
    pub fn triggered(&self) -> bool {
        self.triggered
    }

    /// Checkpoints passed in the current run.
    pub fn checkpoint_count(&self) -> usize {
        self.count
    }

    /// Whether checkpoint `index` is set to fail.
    pub fn will_fail(&self, index: usize) -> bool {
        index < MAX_CHECKPOINTS && self.bit(index)
    }

    /// Move to the next failure pattern after a triggered run.
    ///
    /// The last checkpoint that failed this run succeeds from now on, and
    /// every checkpoint after it fails again. Returns `false`, leaving the
    /// frame unchanged, if the run triggered nothing.
    pub fn advance(&mut self) -> bool {
        if !self.triggered {
            return false;
        }
        let Some(last) = (0..self.count).rev().find(|&i| self.bit(i)) else {
            return false;
        };
        self.set(last, false);
        self.arm_from(last + 1);
        true
    }

    fn bit(&self, i: usize) -> bool {
        (self.bits[i / WORD_BITS] >> (i % WORD_BITS)) & 1 != 0
    }

    fn set(&mut self, i: usize, fail: bool) {
        let mask = 1u64 << (i % WORD_BITS);
        if fail {
            self.bits[i / WORD_BITS] |= mask;
        } else {
            self.bits[i / WORD_BITS] &= !mask;
        }
    }

    /// Set every bit from `start` to the end.
    fn arm_from(&mut self, start: usize) {
        let word = start / WORD_BITS;
        if word >= WORDS {
            return;
        }
        self.bits[word] |= u64::MAX << (start % WORD_BITS);
        for w in &mut self.bits[word + 1..] {
            *w = u64::MAX;
        }
    }
}

impl Default for FailureReplayFrame {
    fn default() -> Self {
        Self::new()
    }
}
