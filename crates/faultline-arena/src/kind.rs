//! Arena allocator kinds.

use faultline_core::{Allocator, AllocatorKind, ConfigError, KindId};

use crate::arena::ArenaAllocator;
use crate::config::ArenaConfig;

/// An allocator kind building arenas with a freshly allocated buffer.
///
/// Distinct ids give distinct registry singletons, so several arena
/// sizes can coexist:
///
/// ```
/// use faultline_arena::{ArenaConfig, ArenaKind};
/// use faultline_core::KindId;
///
/// static SCRATCH: ArenaKind = ArenaKind::new(KindId("scratch"), ArenaConfig::with_capacity(4096));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ArenaKind {
    id: KindId,
    config: ArenaConfig,
}

impl ArenaKind {
    /// A kind with the given registry identity and buffer configuration.
    pub const fn new(id: KindId, config: ArenaConfig) -> Self {
        Self { id, config }
    }

    /// The configuration each instance is built from.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }
}

/// The default arena kind: a 1 MiB buffer.
pub static ARENA: ArenaKind = ArenaKind::new(
    ArenaAllocator::DEFAULT_KIND,
    ArenaConfig::with_capacity(ArenaConfig::DEFAULT_CAPACITY),
);

impl AllocatorKind for ArenaKind {
    fn id(&self) -> KindId {
        self.id
    }

    fn create(&self) -> Result<Box<dyn Allocator>, ConfigError> {
        let arena = ArenaAllocator::new(&self.config)?.with_kind(self.id);
        Ok(Box::new(arena))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_kind_builds_one_mib_arena() {
        assert_eq!(ARENA.id(), KindId("arena"));
        assert_eq!(ARENA.name(), "arena");
        let mut a = ARENA.create().unwrap();
        assert!(a.grab(1000 * 1000).is_some());
        assert_eq!(a.grab(100 * 1000), None);
    }

    #[test]
    fn bad_config_fails_create() {
        let kind = ArenaKind::new(KindId("odd"), ArenaConfig::with_capacity(40));
        assert!(matches!(
            kind.create(),
            Err(ConfigError::BufferNotMultipleOf16 { bytes: 40 })
        ));
    }
}
