use crate::beacon_proposer_cache::{BeaconProposerCache, ProposerProtector};
use crate::canonical_head::{BeaconSnapshot, CanonicalHead};
use crate::chain_config::ChainConfig;
use crate::shuffling_cache::{ShufflingCache, ShufflingProtector};
use crate::sync_status::SyncStatus;
use crate::{BeaconChain, BeaconChainTypes};
use parking_lot::RwLock;
use promise_cache::PromiseCache;
use slog::{info, Logger};
use std::marker::PhantomData;
use std::sync::Arc;
use store::ValidatorIndexStore;
use types::{BeaconState, ChainSpec, EthSpec, Hash256};

/// An empty struct used to "witness" all the `BeaconChainTypes` traits. It has no user-facing
/// functionality and only exists to satisfy the type system.
pub struct Witness<TStore, TSyncStatus, E>(PhantomData<(TStore, TSyncStatus, E)>);

impl<TStore, TSyncStatus, E> BeaconChainTypes for Witness<TStore, TSyncStatus, E>
where
    TStore: ValidatorIndexStore,
    TSyncStatus: SyncStatus,
    E: EthSpec,
{
    type EthSpec = E;
    type Store = TStore;
    type SyncStatus = TSyncStatus;
}

/// Builds a `BeaconChain` by either creating anew from genesis, or, resuming from an existing
/// head.
///
/// Types may be elided and the compiler will infer them once all required methods have been
/// called.
///
/// If type inference errors are raised, ensure all necessary components have been specified.
pub struct BeaconChainBuilder<T: BeaconChainTypes> {
    spec: ChainSpec,
    chain_config: ChainConfig,
    store: Option<Arc<T::Store>>,
    sync_status: Option<Arc<T::SyncStatus>>,
    head: Option<BeaconSnapshot<T::EthSpec>>,
    log: Option<Logger>,
}

impl<TStore, TSyncStatus, E> BeaconChainBuilder<Witness<TStore, TSyncStatus, E>>
where
    TStore: ValidatorIndexStore,
    TSyncStatus: SyncStatus,
    E: EthSpec,
{
    /// Returns a new builder.
    ///
    /// The `_eth_spec_instance` parameter is only supplied to make concrete the `E` trait.
    /// This should generally be either the `MinimalEthSpec` or `MainnetEthSpec` types.
    pub fn new(_eth_spec_instance: E) -> Self {
        Self {
            spec: E::default_spec(),
            chain_config: ChainConfig::default(),
            store: None,
            sync_status: None,
            head: None,
            log: None,
        }
    }
}

impl<T: BeaconChainTypes> BeaconChainBuilder<T> {
    /// Override the default spec (as defined by `T::EthSpec`).
    pub fn custom_spec(mut self, spec: ChainSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn chain_config(mut self, config: ChainConfig) -> Self {
        self.chain_config = config;
        self
    }

    /// Sets the store that maps public keys to validator indices.
    ///
    /// The store is not populated by the builder.
    pub fn store(mut self, store: Arc<T::Store>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn sync_status(mut self, sync_status: Arc<T::SyncStatus>) -> Self {
        self.sync_status = Some(sync_status);
        self
    }

    pub fn logger(mut self, log: Logger) -> Self {
        self.log = Some(log);
        self
    }

    /// Starts the chain from `genesis_state`, whose block has the zero root.
    pub fn genesis_state(self, genesis_state: BeaconState<T::EthSpec>) -> Self {
        self.head(BeaconSnapshot::new(Hash256::ZERO, genesis_state))
    }

    /// Starts the chain from an existing head.
    pub fn head(mut self, head: BeaconSnapshot<T::EthSpec>) -> Self {
        self.head = Some(head);
        self
    }

    /// Consumes `self`, returning a `BeaconChain` if all required parameters have been supplied.
    pub fn build(self) -> Result<BeaconChain<T>, String> {
        let log = self.log.ok_or("Cannot build without a logger")?;
        let store = self.store.ok_or("Cannot build without a store")?;
        let sync_status = self
            .sync_status
            .ok_or("Cannot build without a sync status")?;
        let head = self.head.ok_or("Cannot build without a head state")?;

        if head.beacon_state.randao_mixes.len() != T::EthSpec::epochs_per_historical_vector() {
            return Err(format!(
                "Head state has {} randao mixes, expected {}",
                head.beacon_state.randao_mixes.len(),
                T::EthSpec::epochs_per_historical_vector()
            ));
        }

        let shuffling_cache: ShufflingCache = PromiseCache::new(
            self.chain_config.shuffling_cache_size,
            ShufflingProtector::new(head.shuffling_ids()),
            log.clone(),
        );
        let beacon_proposer_cache: BeaconProposerCache = PromiseCache::new(
            self.chain_config.proposer_cache_size,
            ProposerProtector::new(head.shuffling_ids()),
            log.clone(),
        );

        info!(
            log,
            "Beacon chain initialized";
            "head_block" => ?head.beacon_block_root,
            "head_slot" => %head.beacon_state.slot,
            "validators" => head.beacon_state.validators.len(),
        );

        Ok(BeaconChain {
            beacon_proposer_cache: RwLock::new(beacon_proposer_cache),
            shuffling_cache: RwLock::new(shuffling_cache),
            canonical_head: CanonicalHead::new(head),
            spec: self.spec,
            config: self.chain_config,
            store,
            sync_status,
            log,
        })
    }
}
