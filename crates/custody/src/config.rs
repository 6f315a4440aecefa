//! Factory configuration parameters.

/// Configuration for a [`Factory`](crate::factory::Factory).
///
/// Controls the allocation limit and how overwrite-only storage is
/// prepared. All values are immutable once the factory is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactoryConfig {
    /// Largest single allocation the factory will make, in bytes.
    ///
    /// Default: `isize::MAX`, the largest size any Rust allocation may have.
    pub max_alloc_bytes: usize,

    /// Zero the storage handed out by the `*_for_overwrite` constructors.
    ///
    /// Default: `false`, leaving the storage uninitialised.
    pub zero_overwrite: bool,
}

impl FactoryConfig {
    /// Default allocation limit: `isize::MAX` bytes.
    pub const DEFAULT_MAX_ALLOC_BYTES: usize = isize::MAX as usize;

    /// Create a config with the given allocation limit.
    ///
    /// Uses default values for all other parameters.
    pub fn new(max_alloc_bytes: usize) -> Self {
        Self {
            max_alloc_bytes,
            zero_overwrite: false,
        }
    }

    /// Check `bytes` against the configured limit.
    pub fn admits(&self, bytes: usize) -> bool {
        bytes <= self.max_alloc_bytes
    }
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ALLOC_BYTES)
    }
}
