//! Arena configuration parameters.

use faultline_core::ConfigError;

use crate::node::MIN_BLOCK;

/// Configuration for an arena whose buffer is allocated at create time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Buffer size in bytes.
    ///
    /// Default: 1 MiB. Must be a non-zero multiple of 16.
    pub capacity: usize,

    /// Fill fresh buffers with `0xCC`, and released payloads and destroyed
    /// buffers with `0xFF`.
    ///
    /// Default: on in debug builds, off in release builds.
    pub poison: bool,
}

impl ArenaConfig {
    /// Default buffer size: 1 MiB.
    pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

    /// Create a config with the given capacity and default poisoning.
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            poison: cfg!(debug_assertions),
        }
    }

    /// Check that the capacity can be tiled by arena nodes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_capacity(self.capacity)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

pub(crate) fn validate_capacity(bytes: usize) -> Result<(), ConfigError> {
    if bytes < MIN_BLOCK {
        return Err(ConfigError::BufferTooSmall {
            bytes,
            minimum: MIN_BLOCK,
        });
    }
    if bytes % 16 != 0 {
        return Err(ConfigError::BufferNotMultipleOf16 { bytes });
    }
    Ok(())
}
