//! An allocator that fails wherever the active replay says so.

use faultline_core::{Allocator, AllocatorKind, ConfigError, KindId, Ptr};
use faultline_registry::{get_allocator, AllocatorRef, Fixture, SystemAllocator};
use faultline_replay::simulate_failure;

/// The system allocator behind a checkpoint on every grab and resize.
///
/// Outside a replay loop it never fails. Release always succeeds.
#[derive(Default)]
pub struct FaultyAllocator {
    inner: SystemAllocator,
    forced: usize,
}

impl FaultyAllocator {
    pub const fn new() -> Self {
        Self {
            inner: SystemAllocator::new(),
            forced: 0,
        }
    }

    /// Requests refused because the replay forced a failure.
    pub fn forced_failures(&self) -> usize {
        self.forced
    }

    /// Blocks currently held by callers.
    pub fn live_blocks(&self) -> usize {
        self.inner.live_blocks()
    }

    fn refuse(&mut self, op: &str, n: usize) -> bool {
        if !simulate_failure() {
            return false;
        }
        self.forced += 1;
        log::trace!(target: "faultline::faulty", "forced failure: {op}({n})");
        true
    }
}

impl Allocator for FaultyAllocator {
    fn grab(&mut self, n: usize) -> Option<Ptr> {
        if self.refuse("grab", n) {
            return None;
        }
        self.inner.grab(n)
    }

    fn release(&mut self, p: Ptr) {
        self.inner.release(p);
    }

    fn resize(&mut self, p: Ptr, n: usize) -> Option<Ptr> {
        if self.refuse("resize", n) {
            return None;
        }
        self.inner.resize(p, n)
    }

    fn payload(&self, p: Ptr) -> &[u8] {
        self.inner.payload(p)
    }

    fn payload_mut(&mut self, p: Ptr) -> &mut [u8] {
        self.inner.payload_mut(p)
    }

    fn teardown(&mut self) {
        self.inner.teardown();
    }
}

/// Kind of [`FaultyAllocator`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FaultyKind;

/// The faulty allocator kind.
pub static FAULTY: FaultyKind = FaultyKind;

impl AllocatorKind for FaultyKind {
    fn id(&self) -> KindId {
        KindId("faulty")
    }

    fn create(&self) -> Result<Box<dyn Allocator>, ConfigError> {
        Ok(Box::new(FaultyAllocator::new()))
    }
}

/// Fixture whose default allocator is the faulty allocator.
pub const TEST_FIXTURE: Fixture = Fixture::new("test", &FaultyKind);

/// The process-wide faulty allocator instance.
pub fn get_faulty_allocator() -> Result<AllocatorRef, ConfigError> {
    get_allocator(&FAULTY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_replay::repeat_test_with_stats;

    #[test]
    fn never_fails_outside_a_replay() {
        let mut a = FaultyAllocator::new();
        let p = a.grab(10).unwrap();
        let p = a.resize(p, 20).unwrap();
        a.release(p);
        assert_eq!(a.forced_failures(), 0);
    }

    #[test]
    fn each_request_fails_once_then_succeeds() {
        let mut a = FaultyAllocator::new();
        let outcome = repeat_test_with_stats(|| {
            let Some(p) = a.grab(8) else {
                return false;
            };
            let Some(p) = a.resize(p, 64) else {
                a.release(p);
                return false;
            };
            a.release(p);
            true
        });
        assert!(outcome.result);
        assert_eq!(outcome.runs, 3);
        assert_eq!(a.forced_failures(), 2);
        assert_eq!(a.live_blocks(), 0);
    }

    #[test]
    fn failed_resize_keeps_block() {
        let mut a = FaultyAllocator::new();
        let mut kept = false;
        faultline_replay::repeat_test(|| {
            let Some(p) = a.grab(4) else {
                return false;
            };
            a.payload_mut(p).copy_from_slice(b"keep");
            if a.resize(p, 400).is_none() {
                kept = a.payload(p) == b"keep";
            }
            a.release(p);
            true
        });
        assert!(kept);
    }
}
