//! The process-wide critical section.
//!
//! One reentrant lock guards every registry and arena mutation. A thread
//! may enter it again while already inside; other threads block until
//! the outermost guard is dropped.

use parking_lot::{const_reentrant_mutex, ReentrantMutex, ReentrantMutexGuard};

static CRITICAL: ReentrantMutex<()> = const_reentrant_mutex(());

/// Proof that the current thread is inside the critical section.
pub type CriticalSection = ReentrantMutexGuard<'static, ()>;

/// Enter the critical section, blocking until it is available.
pub fn enter() -> CriticalSection {
    CRITICAL.lock()
}

/// Enter the critical section if no other thread holds it.
pub fn try_enter() -> Option<CriticalSection> {
    CRITICAL.try_lock()
}
