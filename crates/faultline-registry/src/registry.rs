//! The allocator registry and shared instance handles.
//!
//! The registry caches one instance per allocator kind, keyed by
//! [`KindId`], in creation order. Teardown destroys them newest first,
//! so an allocator built on top of another is gone before its
//! dependency is.

use std::fmt;
use std::sync::{Arc, OnceLock};

use faultline_core::exit::{self, ALLOCATOR_EXIT_PRIORITY};
use faultline_core::{critical, fatal, Allocator, AllocatorKind, ConfigError, KindId, Ptr, Violation};
use indexmap::IndexMap;
use parking_lot::Mutex;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

struct Instance {
    kind: KindId,
    name: &'static str,
    /// `None` once destroyed.
    state: Mutex<Option<Box<dyn Allocator>>>,
}

/// A shared handle to one allocator instance.
///
/// Clones refer to the same instance. Every operation runs inside the
/// process-wide critical section. Using a handle after its instance was
/// destroyed is fatal.
#[derive(Clone)]
pub struct AllocatorRef(Arc<Instance>);

impl AllocatorRef {
    fn create(kind: &'static dyn AllocatorKind) -> Result<Self, ConfigError> {
        let allocator = kind.create()?;
        log::debug!(target: "faultline::registry", "created allocator '{}'", kind.name());
        Ok(Self(Arc::new(Instance {
            kind: kind.id(),
            name: kind.name(),
            state: Mutex::new(Some(allocator)),
        })))
    }

    /// Identity of the kind this instance was built from.
    pub fn kind(&self) -> KindId {
        self.0.kind
    }

    /// Diagnostic name of the kind.
    pub fn name(&self) -> &'static str {
        self.0.name
    }

    /// Whether both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether the instance has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        let _cs = critical::enter();
        // Busy means some operation of this thread is running on it.
        self.0.state.try_lock().is_some_and(|state| state.is_none())
    }

    /// Allocate `n` bytes. A zero-byte request yields `None`.
    pub fn allocate(&self, n: usize) -> Option<Ptr> {
        if n == 0 {
            return None;
        }
        self.with_live(|a| a.grab(n))
    }

    /// Resize with null-pointer conventions.
    ///
    /// - no block, `n == 0`: nothing happens, returns `None`
    /// - no block, `n > 0`: same as [`allocate`](Self::allocate)
    /// - a block, `n == 0`: releases it, returns `None`
    /// - otherwise the instance's own resize
    pub fn resize(&self, p: Option<Ptr>, n: usize) -> Option<Ptr> {
        match (p, n) {
            (None, 0) => None,
            (None, n) => self.with_live(|a| a.grab(n)),
            (Some(p), 0) => {
                self.with_live(|a| a.release(p));
                None
            }
            (Some(p), n) => self.with_live(|a| a.resize(p, n)),
        }
    }

    /// Release a block. `None` is a no-op.
    pub fn free(&self, p: Option<Ptr>) {
        if let Some(p) = p {
            self.with_live(|a| a.release(p));
        }
    }

    /// Run `f` over the payload bytes of `p`.
    ///
    /// `f` must not call back into this instance.
    pub fn with_payload<R>(&self, p: Ptr, f: impl FnOnce(&[u8]) -> R) -> R {
        self.with_live(|a| f(a.payload(p)))
    }

    /// Run `f` over the mutable payload bytes of `p`.
    ///
    /// `f` must not call back into this instance.
    pub fn with_payload_mut<R>(&self, p: Ptr, f: impl FnOnce(&mut [u8]) -> R) -> R {
        self.with_live(|a| f(a.payload_mut(p)))
    }

    /// Tear down and drop the instance state. Idempotent.
    fn destroy(&self) {
        let _cs = critical::enter();
        let Some(mut state) = self.0.state.try_lock() else {
            fatal(Violation::ReentrantUse { kind: self.0.kind });
        };
        let allocator = state.take();
        drop(state);
        if let Some(mut allocator) = allocator {
            allocator.teardown();
            log::debug!(target: "faultline::registry", "destroyed allocator '{}'", self.0.name);
        }
    }

    fn with_live<R>(&self, op: impl FnOnce(&mut (dyn Allocator + 'static)) -> R) -> R {
        let _cs = critical::enter();
        // Every holder of `state` also holds the critical section, so a
        // busy lock here means this thread is already inside the instance.
        let Some(mut state) = self.0.state.try_lock() else {
            fatal(Violation::ReentrantUse { kind: self.0.kind });
        };
        match state.as_deref_mut() {
            Some(allocator) => op(allocator),
            None => fatal(Violation::DestroyedAllocator { kind: self.0.kind }),
        }
    }
}

impl fmt::Debug for AllocatorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocatorRef")
            .field("kind", &self.0.kind)
            .finish_non_exhaustive()
    }
}

/// A cache of allocator singletons, one per kind.
pub struct Registry {
    instances: Mutex<IndexMap<KindId, AllocatorRef>>,
}

impl Registry {
    /// An empty registry, independent of the process-wide one.
    pub fn new() -> Self {
        Self {
            instances: Mutex::new(IndexMap::new()),
        }
    }

    /// The process-wide registry.
    ///
    /// The first call registers its teardown as an exit handler in the
    /// allocator priority band.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(|| {
            exit::register(teardown_global, ALLOCATOR_EXIT_PRIORITY);
            Registry::new()
        })
    }

    /// The cached instance of `kind`, creating it on first use.
    ///
    /// A kind's `create` may itself look up other kinds here; those
    /// dependencies are registered first and so are destroyed last.
    pub fn get_or_create(&self, kind: &'static dyn AllocatorKind) -> Result<AllocatorRef, ConfigError> {
        let _cs = critical::enter();
        let id = kind.id();
        if let Some(found) = self.instances.lock().get(&id) {
            return Ok(found.clone());
        }

        let created = AllocatorRef::create(kind)?;
        let mut instances = self.instances.lock();
        if let Some(found) = instances.get(&id) {
            // `create` looked up its own kind; keep the first instance.
            let found = found.clone();
            drop(instances);
            created.destroy();
            return Ok(found);
        }
        instances.insert(id, created.clone());
        Ok(created)
    }

    /// Build an instance of `kind` that the registry does not cache.
    pub fn new_allocator(&self, kind: &'static dyn AllocatorKind) -> Result<AllocatorRef, ConfigError> {
        let _cs = critical::enter();
        AllocatorRef::create(kind)
    }

    /// Destroy an instance. `None` is a no-op.
    ///
    /// A cached instance is also removed from the registry, so the next
    /// lookup of its kind builds a fresh one.
    pub fn delete_allocator(&self, instance: Option<AllocatorRef>) {
        let Some(instance) = instance else {
            return;
        };
        let _cs = critical::enter();
        {
            let mut instances = self.instances.lock();
            let cached = instances
                .get(&instance.kind())
                .is_some_and(|found| found.ptr_eq(&instance));
            if cached {
                instances.shift_remove(&instance.kind());
            }
        }
        instance.destroy();
    }

    /// Number of cached instances.
    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    /// Whether no instance is cached.
    pub fn is_empty(&self) -> bool {
        self.instances.lock().is_empty()
    }

    /// Kinds of the cached instances, oldest first.
    pub fn kinds(&self) -> Vec<KindId> {
        self.instances.lock().keys().copied().collect()
    }

    /// Destroy every cached instance, newest first.
    ///
    /// Other threads must have stopped allocating. Running it again is a
    /// no-op.
    pub fn teardown(&self) {
        let _cs = critical::enter();
        loop {
            // Pop under the lock, destroy outside it: teardown may release
            // into an older allocator.
            let newest = self.instances.lock().pop();
            match newest {
                Some((_, instance)) => instance.destroy(),
                None => break,
            }
        }
        debug_assert!(self.instances.lock().is_empty());
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn teardown_global() {
    if let Some(registry) = GLOBAL.get() {
        registry.teardown();
    }
}

/// The process-wide instance of `kind`.
pub fn get_allocator(kind: &'static dyn AllocatorKind) -> Result<AllocatorRef, ConfigError> {
    Registry::global().get_or_create(kind)
}
