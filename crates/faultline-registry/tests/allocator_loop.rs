//! Integration test: the same grab/resize/release loop on every kind.
//!
//! Runs a grow-then-shrink cycle ten thousand times through the
//! process-wide registry, first on the system allocator and then on a
//! registry-owned arena, checking that neighbouring blocks stay intact.
//! A shared arena is also driven from several threads at once.

use std::thread;

use faultline_arena::{ArenaConfig, ArenaKind, ARENA};
use faultline_core::{AllocatorKind, KindId};
use faultline_registry::{get_allocator, AllocatorRef, Registry, SYSTEM};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_filled(a: &AllocatorRef, p: faultline_core::Ptr, len: usize, byte: u8) {
    a.with_payload(p, |bytes| assert!(bytes[..len].iter().all(|&b| b == byte)));
}

fn exercise(a: &AllocatorRef) {
    for _ in 0..10_000 {
        // Zero-byte requests yield no block; freeing no block is fine.
        let p0 = a.allocate(0);
        a.free(p0);

        let p1 = a.allocate(15).unwrap();
        a.with_payload_mut(p1, |b| b[..15].fill(b'!'));
        let p2 = a.allocate(12).unwrap();
        a.with_payload_mut(p2, |b| b[..12].fill(b'a'));

        let p1 = a.resize(Some(p1), 55).unwrap();
        assert_filled(a, p1, 15, b'!');
        a.with_payload_mut(p1, |b| b[..55].fill(b'x'));
        assert_filled(a, p2, 12, b'a');

        let p1 = a.resize(Some(p1), 10).unwrap();
        assert_filled(a, p1, 10, b'x');
        assert_filled(a, p2, 12, b'a');

        a.free(Some(p1));
        a.free(Some(p2));
    }
}

#[test]
fn loop_on_system_allocator() {
    init_logging();
    let a = get_allocator(&SYSTEM).unwrap();
    exercise(&a);
}

#[test]
fn loop_on_arena_allocator() {
    init_logging();
    let a = get_allocator(&ARENA).unwrap();
    assert_eq!(a.kind(), ARENA.id());
    exercise(&a);
}

#[test]
fn deleting_nothing_is_harmless() {
    init_logging();
    Registry::global().delete_allocator(None);
}

#[test]
fn local_arena_is_not_cached() {
    init_logging();
    let registry = Registry::new();
    let local = registry.new_allocator(&ARENA).unwrap();
    assert!(registry.is_empty());
    exercise(&local);
    registry.delete_allocator(Some(local));
}

const SHARED_CAPACITY: usize = 64 * 1024;

/// Used only by the threaded test, so no other test holds its blocks.
static SHARED_ARENA: ArenaKind = ArenaKind::new(
    KindId("shared-arena"),
    ArenaConfig::with_capacity(SHARED_CAPACITY),
);

/// Churn four tagged blocks, checking every live block after each step.
fn exercise_tagged(a: &AllocatorRef, tag: u8) {
    let mut live = Vec::new();
    for round in 0..2_000usize {
        let len = 8 + (round * 7 + tag as usize) % 56;
        let p = a.allocate(len).unwrap();
        a.with_payload_mut(p, |b| b[..len].fill(tag));
        live.push((p, len));

        if round % 3 == 0 {
            let (p, len) = live.remove(0);
            let grown = len + 24;
            let p = a.resize(Some(p), grown).unwrap();
            assert_filled(a, p, len, tag);
            a.with_payload_mut(p, |b| b[..grown].fill(tag));
            live.push((p, grown));
        }
        if live.len() > 4 {
            let (p, len) = live.remove(0);
            assert_filled(a, p, len, tag);
            a.free(Some(p));
        }
        for &(p, len) in &live {
            assert_filled(a, p, len, tag);
        }
    }
    for (p, len) in live {
        assert_filled(a, p, len, tag);
        a.free(Some(p));
    }
}

#[test]
fn shared_arena_survives_concurrent_threads() {
    init_logging();
    let handles: Vec<_> = (1..=8u8)
        .map(|tag| {
            thread::spawn(move || {
                let a = get_allocator(&SHARED_ARENA).unwrap();
                exercise_tagged(&a, tag);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Everything was released, so the whole buffer coalesces into one block.
    let a = get_allocator(&SHARED_ARENA).unwrap();
    let whole = a.allocate(SHARED_CAPACITY - 8).unwrap();
    a.free(Some(whole));
}

#[test]
fn huge_request_on_system_allocator_returns_none() {
    init_logging();
    let a = get_allocator(&SYSTEM).unwrap();
    assert_eq!(a.allocate(usize::MAX), None);
    let p = a.allocate(16).unwrap();
    a.with_payload_mut(p, |b| b.fill(7));
    assert_eq!(a.resize(Some(p), usize::MAX), None);
    assert_filled(&a, p, 16, 7);
    a.free(Some(p));
}
