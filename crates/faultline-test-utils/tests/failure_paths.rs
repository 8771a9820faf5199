//! Integration test: every allocation failure branch is reached exactly once.
//!
//! Ordinary code allocating through `faultline_registry::memory` runs under
//! `repeat_test` with the test fixture selected. Each callback counts which
//! branch it took; the replay must visit each branch once and finish on
//! the all-success path.

use std::cell::Cell;

use faultline_core::Ptr;
use faultline_registry::fixture::use_fixture;
use faultline_registry::memory::{allocate, free, resize, with_bytes, with_bytes_mut};
use faultline_replay::repeat_test;
use faultline_test_utils::{init_test_logging, TEST_FIXTURE};

#[derive(Default)]
struct Paths([Cell<u32>; 4]);

impl Paths {
    fn hit(&self, path: usize) {
        let c = &self.0[path - 1];
        c.set(c.get() + 1);
    }

    fn counts(&self) -> [u32; 4] {
        [0, 1, 2, 3].map(|i| self.0[i].get())
    }
}

fn assert_bytes(p: Ptr, expected: &[u8]) {
    with_bytes(p, |bytes| assert_eq!(&bytes[..expected.len()], expected));
}

/// Allocate, exercise the bytes, then grow twice.
fn allocate_and_grow(paths: &Paths) -> bool {
    let Some(mut p) = allocate(100) else {
        paths.hit(1);
        return false;
    };

    with_bytes_mut(p, |b| b.fill(0));
    with_bytes_mut(p, |b| b.fill(0xCC));
    with_bytes_mut(p, |b| b[..1].fill(0xFF));
    assert_bytes(p, &[0xFF, 0xCC]);
    with_bytes_mut(p, |b| b[..1].fill(0));
    with_bytes_mut(p, |b| b[..2].fill(0xEE));
    with_bytes_mut(p, |b| b.copy_within(0..1, 3));
    assert_bytes(p, &[0xEE, 0xEE, 0xCC, 0xEE, 0xCC]);
    with_bytes_mut(p, |b| b.copy_within(1..5, 0));
    assert_bytes(p, &[0xEE, 0xCC, 0xEE, 0xCC, 0xCC]);
    with_bytes_mut(p, |b| b.swap(0, 1));

    let mut expected = vec![0xCC; 100];
    expected[1] = 0xEE;
    expected[2] = 0xEE;
    assert_bytes(p, &expected);

    let ok = match resize(Some(p), 10_000) {
        Some(q) => {
            p = q;
            assert_bytes(p, &expected);
            with_bytes_mut(p, |b| b[..10_000].fill(0));
            match resize(Some(p), 100_000) {
                Some(q) => {
                    p = q;
                    assert_bytes(p, &[0; 10_000]);
                    paths.hit(4);
                    true
                }
                None => {
                    paths.hit(3);
                    false
                }
            }
        }
        None => {
            paths.hit(2);
            false
        }
    };
    free(Some(p));
    ok
}

/// Allocate a hundred blocks, giving up at the first failure.
fn sequential(paths: &Paths) -> bool {
    let mut blocks = Vec::with_capacity(100);
    let mut ok = true;
    while blocks.len() < 100 {
        match allocate(100) {
            Some(p) => blocks.push(p),
            None => {
                paths.hit(1);
                ok = false;
                break;
            }
        }
    }
    while let Some(p) = blocks.pop() {
        free(Some(p));
    }
    ok
}

/// Recover from a failed allocation with a smaller one.
fn handler1(paths: &Paths) -> bool {
    let (p, ok) = match allocate(100) {
        Some(p) => match resize(Some(p), 10_000) {
            Some(q) => {
                paths.hit(4);
                (Some(q), true)
            }
            None => {
                paths.hit(3);
                (Some(p), false)
            }
        },
        None => match allocate(10) {
            Some(p) => {
                paths.hit(2);
                (Some(p), true)
            }
            None => {
                paths.hit(1);
                (None, false)
            }
        },
    };
    free(p);
    ok
}

/// Fall back through successively smaller allocations.
fn handler2(paths: &Paths) -> bool {
    let (p, ok) = if let Some(p) = allocate(1000) {
        paths.hit(4);
        (Some(p), true)
    } else if let Some(p) = allocate(100) {
        paths.hit(3);
        (Some(p), true)
    } else if let Some(p) = allocate(10) {
        paths.hit(2);
        (Some(p), true)
    } else {
        paths.hit(1);
        (None, false)
    };
    free(p);
    ok
}

fn run(test: fn(&Paths) -> bool) -> [u32; 4] {
    init_test_logging();
    let _fixture = use_fixture(TEST_FIXTURE);
    let paths = Paths::default();
    assert!(repeat_test(|| test(&paths)));
    paths.counts()
}

#[test]
fn allocate_and_grow_hits_every_path() {
    assert_eq!(run(allocate_and_grow), [1, 1, 1, 1]);
}

#[test]
fn sequential_fails_at_each_allocation() {
    assert_eq!(run(sequential), [100, 0, 0, 0]);
}

#[test]
fn handler1_hits_every_path() {
    assert_eq!(run(handler1), [1, 1, 1, 1]);
}

#[test]
fn handler2_hits_every_path() {
    assert_eq!(run(handler2), [1, 1, 1, 1]);
}

#[test]
fn default_fixture_never_fails() {
    init_test_logging();
    let paths = Paths::default();
    assert!(repeat_test(|| handler2(&paths)));
    assert_eq!(paths.counts(), [0, 0, 0, 1]);
}
