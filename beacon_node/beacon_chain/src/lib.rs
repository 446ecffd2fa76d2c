pub mod beacon_chain;
mod beacon_proposer_cache;
pub mod builder;
pub mod canonical_head;
pub mod chain_config;
mod errors;
pub mod metrics;
pub mod shuffling_cache;
pub mod sync_status;
pub mod test_utils;
mod validator_duties;

pub use self::beacon_chain::{BeaconChain, BeaconChainTypes};
pub use self::beacon_proposer_cache::{BeaconProposerCache, ProposerProtector};
pub use self::builder::BeaconChainBuilder;
pub use self::canonical_head::{BeaconSnapshot, CanonicalHead};
pub use self::chain_config::ChainConfig;
pub use self::errors::{BeaconChainError, DutiesError};
pub use self::shuffling_cache::{BlockShufflingIds, ShufflingCache, ShufflingProtector};
pub use self::sync_status::{ManualSyncStatus, SyncStatus};
pub use store;
pub use types;
