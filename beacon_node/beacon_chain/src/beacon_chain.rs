use crate::beacon_proposer_cache::{BeaconProposerCache, ProposerProtector};
use crate::canonical_head::{BeaconSnapshot, CanonicalHead};
use crate::chain_config::ChainConfig;
use crate::errors::BeaconChainError as Error;
use crate::metrics;
use crate::shuffling_cache::{ShufflingCache, ShufflingProtector};
use crate::sync_status::SyncStatus;
use parking_lot::RwLock;
use slog::{debug, Logger};
use std::sync::Arc;
use std::time::Duration;
use store::ValidatorIndexStore;
use types::*;

/// The time to wait for the shuffling cache lock before giving up.
pub const SHUFFLING_CACHE_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// The time to wait for the proposer cache lock before giving up.
pub const PROPOSER_CACHE_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

pub trait BeaconChainTypes: Send + Sync + 'static {
    type EthSpec: EthSpec;
    type Store: ValidatorIndexStore;
    type SyncStatus: SyncStatus;
}

/// Represents the "Beacon Chain" component of Ethereum 2.0, as far as validator duties are
/// concerned: a head state and the caches needed to derive duties from it.
pub struct BeaconChain<T: BeaconChainTypes> {
    pub spec: ChainSpec,
    pub config: ChainConfig,
    /// Maps validator public keys to their indices.
    pub store: Arc<T::Store>,
    /// The head of the chain.
    pub canonical_head: CanonicalHead<T::EthSpec>,
    /// Caches the shuffling of an epoch, so that it is computed once per `ShufflingId`.
    pub shuffling_cache: RwLock<ShufflingCache>,
    /// Caches the beacon block proposers for a given `(epoch, decision root)`, so that they are
    /// computed once per key.
    pub beacon_proposer_cache: RwLock<BeaconProposerCache>,
    pub sync_status: Arc<T::SyncStatus>,
    pub log: Logger,
}

impl<T: BeaconChainTypes> BeaconChain<T> {
    /// Returns the current head snapshot.
    pub fn head(&self) -> Result<Arc<BeaconSnapshot<T::EthSpec>>, Error> {
        self.canonical_head.cached_head()
    }

    /// Replace the head of the chain.
    ///
    /// Public keys of validators that joined the registry are added to the store, and the
    /// shufflings of the new head are protected from eviction.
    pub fn update_head(&self, snapshot: BeaconSnapshot<T::EthSpec>) -> Result<(), Error> {
        self.store.import_new_pubkeys(&snapshot.beacon_state)?;

        let shuffling_ids = snapshot.shuffling_ids();
        let new_epoch = snapshot.current_epoch();
        let old_head = self.canonical_head.replace(snapshot)?;

        self.shuffling_cache
            .try_write_for(SHUFFLING_CACHE_LOCK_TIMEOUT)
            .ok_or(Error::ShufflingCacheLockTimeout)?
            .update_protector(ShufflingProtector::new(shuffling_ids));
        self.beacon_proposer_cache
            .try_write_for(PROPOSER_CACHE_LOCK_TIMEOUT)
            .ok_or(Error::ProposerCacheLockTimeout)?
            .update_protector(ProposerProtector::new(shuffling_ids));

        debug!(
            self.log,
            "Updated head";
            "previous_root" => ?old_head.beacon_block_root,
            "block_root" => ?shuffling_ids.block_root,
            "epoch" => %new_epoch,
        );

        Ok(())
    }

    /// Returns the committee cache of `shuffling_epoch` as seen from the current head.
    pub fn committee_cache(&self, shuffling_epoch: Epoch) -> Result<Arc<CommitteeCache>, Error> {
        let head = self.head()?;
        self.committee_cache_for_head(&head, shuffling_epoch)
    }

    /// Runs `map_fn` with the committee cache of `shuffling_epoch` and the root of the block
    /// which decided it.
    ///
    /// ## Notes
    ///
    /// The cache is computed at most once per `ShufflingId`: concurrent callers for the same
    /// shuffling wait on the first caller's computation rather than repeating it.
    pub fn with_committee_cache<F, R>(
        &self,
        head: &BeaconSnapshot<T::EthSpec>,
        shuffling_epoch: Epoch,
        map_fn: F,
    ) -> Result<R, Error>
    where
        F: FnOnce(&CommitteeCache, Hash256) -> Result<R, Error>,
    {
        let committee_cache = self.committee_cache_for_head(head, shuffling_epoch)?;
        map_fn(&committee_cache, head.beacon_block_root)
    }

    fn committee_cache_for_head(
        &self,
        head: &BeaconSnapshot<T::EthSpec>,
        shuffling_epoch: Epoch,
    ) -> Result<Arc<CommitteeCache>, Error> {
        let shuffling_id = head.shuffling_ids().id_for_epoch(shuffling_epoch).ok_or(
            Error::InvalidShufflingId {
                shuffling_epoch,
                head_block_epoch: head.current_epoch(),
            },
        )?;

        let mut shuffling_cache = self
            .shuffling_cache
            .try_write_for(SHUFFLING_CACHE_LOCK_TIMEOUT)
            .ok_or(Error::ShufflingCacheLockTimeout)?;

        if let Some(cache_item) = shuffling_cache.get(&shuffling_id) {
            // The shuffling cache is no longer required, drop the write-lock to allow concurrent
            // access.
            drop(shuffling_cache);

            metrics::inc_counter(&metrics::SHUFFLING_CACHE_HITS);
            if cache_item.is_promise() {
                metrics::inc_counter(&metrics::SHUFFLING_CACHE_PROMISE_WAITS);
            }

            return Ok(cache_item.wait()?);
        }

        metrics::inc_counter(&metrics::SHUFFLING_CACHE_MISSES);

        // Creating the promise whilst we hold the `shuffling_cache` lock will prevent the same
        // promise from being created twice.
        let sender = shuffling_cache.create_promise(shuffling_id)?;

        // Drop the shuffling cache to avoid holding the lock for any longer than required.
        drop(shuffling_cache);

        debug!(
            self.log,
            "Committee cache miss";
            "shuffling_epoch" => %shuffling_epoch,
            "head_block_root" => ?head.beacon_block_root,
        );

        let committee_building_timer = metrics::start_timer(&metrics::COMMITTEE_CACHE_BUILD_TIMES);

        // On failure `sender` is dropped here, which fails any waiting threads and leaves the
        // promise to be removed on the next access.
        let committee_cache =
            CommitteeCache::initialized(&head.beacon_state, shuffling_epoch, &self.spec)?;

        metrics::stop_timer(committee_building_timer);

        let mut shuffling_cache = self
            .shuffling_cache
            .try_write_for(SHUFFLING_CACHE_LOCK_TIMEOUT)
            .ok_or(Error::ShufflingCacheLockTimeout)?;
        shuffling_cache.resolve_promise(sender, shuffling_id, committee_cache.clone());
        metrics::set_gauge(&metrics::SHUFFLING_CACHE_SIZE, shuffling_cache.len() as i64);

        Ok(committee_cache)
    }

    /// Returns the proposer of each slot of `epoch`, in slot order.
    ///
    /// Like the committee cache, the proposers are computed at most once per
    /// `(epoch, decision root)`.
    pub fn proposers_for_epoch(
        &self,
        head: &BeaconSnapshot<T::EthSpec>,
        epoch: Epoch,
    ) -> Result<Arc<Vec<usize>>, Error> {
        let key = (epoch, head.beacon_block_root);
        let slots_per_epoch = T::EthSpec::slots_per_epoch() as usize;

        let mut proposer_cache = self
            .beacon_proposer_cache
            .try_write_for(PROPOSER_CACHE_LOCK_TIMEOUT)
            .ok_or(Error::ProposerCacheLockTimeout)?;

        if let Some(cache_item) = proposer_cache.get(&key) {
            drop(proposer_cache);

            metrics::inc_counter(&metrics::PROPOSER_CACHE_HITS);
            let proposers = cache_item.wait().map_err(Error::ProposerCacheError)?;
            if proposers.len() != slots_per_epoch {
                return Err(Error::ProposerCacheIncorrectLength {
                    epoch,
                    expected: slots_per_epoch,
                    found: proposers.len(),
                });
            }
            return Ok(proposers);
        }

        metrics::inc_counter(&metrics::PROPOSER_CACHE_MISSES);

        let sender = proposer_cache
            .create_promise(key)
            .map_err(Error::ProposerCacheError)?;
        drop(proposer_cache);

        let timer = metrics::start_timer(&metrics::PROPOSER_COMPUTATION_TIMES);
        let proposers = Arc::new(
            head.beacon_state
                .get_beacon_proposer_indices(epoch, &self.spec)?,
        );
        metrics::stop_timer(timer);

        self.beacon_proposer_cache
            .try_write_for(PROPOSER_CACHE_LOCK_TIMEOUT)
            .ok_or(Error::ProposerCacheLockTimeout)?
            .resolve_promise(sender, key, proposers.clone());

        Ok(proposers)
    }
}
