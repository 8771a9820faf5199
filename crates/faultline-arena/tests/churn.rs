//! Integration test: long-running grab/resize/release churn on one arena.
//!
//! Repeats the same allocation pattern many times and then runs a seeded
//! random workload, checking that payloads stay intact and the arena
//! returns to a single free run once everything is released.

use faultline_arena::{ArenaAllocator, ArenaConfig};
use faultline_core::{Allocator, Ptr};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_filled(a: &ArenaAllocator, p: Ptr, len: usize, byte: u8) {
    assert!(a.payload(p)[..len].iter().all(|&b| b == byte));
}

#[test]
fn repeated_grow_shrink_cycle() {
    init_logging();
    let mut a = ArenaAllocator::new(&ArenaConfig::with_capacity(1024)).unwrap();

    for _ in 0..10_000 {
        let p0 = a.grab(0).unwrap();
        a.release(p0);

        let p1 = a.grab(15).unwrap();
        a.payload_mut(p1)[..15].fill(b'!');
        let p2 = a.grab(12).unwrap();
        a.payload_mut(p2)[..12].fill(b'a');

        let p1 = a.resize(p1, 55).unwrap();
        assert_filled(&a, p1, 15, b'!');
        a.payload_mut(p1)[..55].fill(b'x');
        assert_filled(&a, p2, 12, b'a');

        let p1 = a.resize(p1, 10).unwrap();
        assert_filled(&a, p1, 10, b'x');
        assert_filled(&a, p2, 12, b'a');

        a.release(p1);
        a.release(p2);
    }

    assert!(a.check().is_ok());
    // Everything is free again; one grab of the whole payload must fit.
    assert!(a.grab(1024 - 8).is_some());
}

#[test]
fn seeded_random_workload_keeps_payloads() {
    init_logging();
    let mut a = ArenaAllocator::new(&ArenaConfig::with_capacity(16 * 1024)).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let mut live: Vec<(Ptr, usize, u8)> = Vec::new();

    for step in 0..5_000u32 {
        let roll = rng.next_u32() % 10;
        if roll < 5 || live.is_empty() {
            let n = (rng.next_u32() % 512) as usize;
            let tag = (step % 251) as u8 + 1;
            if let Some(p) = a.grab(n) {
                a.payload_mut(p)[..n].fill(tag);
                live.push((p, n, tag));
            }
        } else if roll < 8 {
            let idx = rng.next_u32() as usize % live.len();
            let (p, _, _) = live.swap_remove(idx);
            a.release(p);
        } else {
            let idx = rng.next_u32() as usize % live.len();
            let (p, len, tag) = live[idx];
            let n = (rng.next_u32() % 1024) as usize;
            if let Some(q) = a.resize(p, n) {
                assert_filled(&a, q, len.min(n), tag);
                a.payload_mut(q)[..n].fill(tag);
                live[idx] = (q, n, tag);
            }
        }
    }

    for &(p, len, tag) in &live {
        assert_filled(&a, p, len, tag);
    }
    for (p, _, _) in live.drain(..) {
        a.release(p);
    }
    assert!(a.check().is_ok());
    assert_eq!(a.stats().allocated_nodes, 0);
    assert!(a.grab(16 * 1024 - 8).is_some());
}
