use serde::{Deserialize, Serialize};

/// The number of shufflings kept by default.
///
/// Each entry holds one `usize` per active validator, plus one `Option<NonZeroUsize>` per
/// validator in the registry, so with 1M validators an entry is approx 16 MB.
pub const DEFAULT_SHUFFLING_CACHE_SIZE: usize = 16;

/// The number of proposer lists kept by default.
pub const DEFAULT_PROPOSER_CACHE_SIZE: usize = 16;

#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Maximum number of shufflings (and in-flight shuffling computations) to cache.
    pub shuffling_cache_size: usize,
    /// Maximum number of epochs of proposers to cache.
    pub proposer_cache_size: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            shuffling_cache_size: DEFAULT_SHUFFLING_CACHE_SIZE,
            proposer_cache_size: DEFAULT_PROPOSER_CACHE_SIZE,
        }
    }
}
