//! Priority-ordered exit handlers.
//!
//! Subsystems register teardown functions with a priority; at process
//! exit they run from the highest priority to the lowest. Thread-local
//! storage cleanup runs before allocator cleanup, so its band is higher.
//!
//! The process `atexit` hook is installed once, on the first
//! registration.

use std::sync::Once;

use parking_lot::{const_mutex, Mutex};

/// A teardown function run at process exit.
pub type ExitHandler = fn();

/// Priority band reserved for allocator teardown.
pub const ALLOCATOR_EXIT_PRIORITY: i32 = 20;

/// Priority band for thread-local storage teardown. Runs before allocators.
pub const TLS_EXIT_PRIORITY: i32 = 30;

#[derive(Clone, Copy)]
struct Entry {
    handler: ExitHandler,
    priority: i32,
}

static HANDLERS: Mutex<Vec<Entry>> = const_mutex(Vec::new());
static INSTALL: Once = Once::new();

/// Register `handler` to run at process exit.
///
/// Returns `false` if the same function is already registered; the
/// earlier registration and its priority are kept.
pub fn register(handler: ExitHandler, priority: i32) -> bool {
    INSTALL.call_once(install_atexit);
    insert(&mut HANDLERS.lock(), handler, priority)
}

/// Run and forget every registered handler, highest priority first.
///
/// Invoked by the process `atexit` hook. Handlers may register further
/// handlers; those run in a later pass of the same call.
pub fn run_exit_handlers() {
    loop {
        let pending = std::mem::take(&mut *HANDLERS.lock());
        if pending.is_empty() {
            break;
        }
        for entry in pending {
            log::debug!(
                target: "faultline::exit",
                "running exit handler (priority {})",
                entry.priority
            );
            (entry.handler)();
        }
    }
}

fn insert(table: &mut Vec<Entry>, handler: ExitHandler, priority: i32) -> bool {
    if table.iter().any(|e| e.handler as usize == handler as usize) {
        return false;
    }
    let at = table
        .iter()
        .position(|e| priority >= e.priority)
        .unwrap_or(table.len());
    table.insert(at, Entry { handler, priority });
    true
}

extern "C" fn on_process_exit() {
    run_exit_handlers();
}

fn install_atexit() {
    // SAFETY: `on_process_exit` is a plain `extern "C"` function with no
    // captured state, valid for the whole process lifetime.
    #[allow(unsafe_code)]
    let rc = unsafe { libc::atexit(on_process_exit) };
    if rc != 0 {
        log::error!(target: "faultline::exit", "cannot register atexit hook (rc = {rc})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    static LAST: AtomicUsize = AtomicUsize::new(0);

    fn a() {
        LAST.store(1, Ordering::Relaxed);
    }
    fn b() {
        LAST.store(2, Ordering::Relaxed);
    }
    fn c() {
        LAST.store(3, Ordering::Relaxed);
    }

    fn priorities(table: &[Entry]) -> Vec<i32> {
        table.iter().map(|e| e.priority).collect()
    }

    #[test]
    fn ordered_highest_priority_first() {
        let mut table = Vec::new();
        assert!(insert(&mut table, a, ALLOCATOR_EXIT_PRIORITY));
        assert!(insert(&mut table, b, TLS_EXIT_PRIORITY));
        assert!(insert(&mut table, c, 0));
        assert_eq!(priorities(&table), vec![30, 20, 0]);
        assert_eq!(table[0].handler as usize, b as usize);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut table = Vec::new();
        assert!(insert(&mut table, a, 5));
        assert!(!insert(&mut table, a, 50));
        assert_eq!(priorities(&table), vec![5]);
    }

    #[test]
    fn equal_priority_runs_newest_first() {
        let mut table = Vec::new();
        insert(&mut table, a, 10);
        insert(&mut table, b, 10);
        assert_eq!(table[0].handler as usize, b as usize);
    }
}
