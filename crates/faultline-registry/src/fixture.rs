//! Fixtures: per-thread selection of the default allocator.
//!
//! A [`Fixture`] names the allocator kind that plain allocation calls
//! should use. Each thread has its own current fixture, starting at
//! [`DEFAULT_FIXTURE`]. Threads started with [`spawn`] begin with a copy
//! of their parent's selection; later changes on either side stay local.

use std::cell::Cell;
use std::fmt;
use std::thread::JoinHandle;

use faultline_core::{AllocatorKind, ConfigError};

use crate::registry::{get_allocator, AllocatorRef};
use crate::system::SystemKind;

/// A swappable environment: which allocator is the default.
#[derive(Clone, Copy)]
pub struct Fixture {
    name: &'static str,
    default_kind: &'static dyn AllocatorKind,
}

impl Fixture {
    /// A fixture resolving the default allocator to `default_kind`.
    pub const fn new(name: &'static str, default_kind: &'static dyn AllocatorKind) -> Self {
        Self { name, default_kind }
    }

    /// Diagnostic name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The registry's instance of this fixture's default kind.
    pub fn resolve_default_allocator(&self) -> Result<AllocatorRef, ConfigError> {
        get_allocator(self.default_kind)
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("name", &self.name)
            .field("default_kind", &self.default_kind.id())
            .finish()
    }
}

/// The production fixture: plain allocation goes to the system allocator.
pub const DEFAULT_FIXTURE: Fixture = Fixture::new("default", &SystemKind);

thread_local! {
    static CURRENT: Cell<Fixture> = const { Cell::new(DEFAULT_FIXTURE) };
}

/// Select `fixture` for the calling thread.
pub fn set_fixture(fixture: Fixture) {
    log::debug!(target: "faultline::fixture", "using fixture '{}'", fixture.name);
    CURRENT.with(|current| current.set(fixture));
}

/// The calling thread's fixture.
pub fn current_fixture() -> Fixture {
    CURRENT.with(Cell::get)
}

/// Restores the previously selected fixture on drop.
#[must_use = "the fixture is restored as soon as the guard is dropped"]
pub struct FixtureGuard {
    previous: Fixture,
}

impl Drop for FixtureGuard {
    fn drop(&mut self) {
        let previous = self.previous;
        let _ = CURRENT.try_with(|current| current.set(previous));
    }
}

/// Select `fixture` until the returned guard is dropped.
pub fn use_fixture(fixture: Fixture) -> FixtureGuard {
    let previous = current_fixture();
    set_fixture(fixture);
    FixtureGuard { previous }
}

/// The calling thread's default allocator.
pub fn default_allocator() -> Result<AllocatorRef, ConfigError> {
    current_fixture().resolve_default_allocator()
}

/// Spawn a thread that starts with a copy of the caller's fixture.
pub fn spawn<F, T>(f: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let inherited = current_fixture();
    std::thread::spawn(move || {
        CURRENT.with(|current| current.set(inherited));
        f()
    })
}
