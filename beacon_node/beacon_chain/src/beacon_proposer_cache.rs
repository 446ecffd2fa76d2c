//! The `BeaconProposer` cache stores the proposer indices for some epoch.
//!
//! This cache is keyed by `(epoch, block_root)` where `block_root` is the root of the block that
//! decided the shuffling of `epoch`. We make the assertion that the proposer shuffling is identical
//! for all requests in `epoch` which share that `block_root`.
//!
//! Proposers that are being computed are represented by a promise, so concurrent requests for the
//! same key compute them once. See `BeaconChain::proposers_for_epoch`.
use crate::shuffling_cache::BlockShufflingIds;
use promise_cache::{PromiseCache, Protect};
use slog::{debug, Logger};
use types::{Epoch, Hash256};

/// A cache of the proposers of each slot of an epoch.
///
/// Each value is a list of length `E::slots_per_epoch()`. E.g., for epoch `1` the first entry is
/// the proposer for slot `32`.
pub type BeaconProposerCache = PromiseCache<(Epoch, Hash256), Vec<usize>, ProposerProtector>;

/// Evicts the proposers of the oldest epochs first and never evicts those of the head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProposerProtector {
    head_shuffling_ids: BlockShufflingIds,
}

impl ProposerProtector {
    pub fn new(head_shuffling_ids: BlockShufflingIds) -> Self {
        Self { head_shuffling_ids }
    }
}

impl Protect<(Epoch, Hash256)> for ProposerProtector {
    type SortKey = Epoch;

    fn sort_key(&self, k: &(Epoch, Hash256)) -> Epoch {
        k.0
    }

    fn protect_from_eviction(&self, (epoch, decision_root): &(Epoch, Hash256)) -> bool {
        *decision_root == self.head_shuffling_ids.block_root
            && self.head_shuffling_ids.id_for_epoch(*epoch).is_some()
    }

    fn notify_eviction(&self, (epoch, decision_root): &(Epoch, Hash256), log: &Logger) {
        debug!(
            log,
            "Removing proposers from cache";
            "epoch" => %epoch,
            "decision_root" => ?decision_root,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logging::test_logger;
    use std::sync::Arc;

    #[test]
    fn evicts_oldest_unprotected_epochs() {
        let head_root = Hash256::repeat_byte(7);
        let head_ids = BlockShufflingIds::new(head_root, Epoch::new(2));
        let mut cache: BeaconProposerCache =
            PromiseCache::new(3, ProposerProtector::new(head_ids), test_logger());

        cache.insert_value((Epoch::new(2), head_root), Arc::new(vec![2]));
        cache.insert_value((Epoch::new(3), head_root), Arc::new(vec![3]));
        for epoch in [0, 1, 4] {
            cache.insert_value(
                (Epoch::new(epoch), Hash256::ZERO),
                Arc::new(vec![epoch as usize]),
            );
        }

        assert_eq!(cache.len(), 3);
        assert!(cache.contains(&(Epoch::new(2), head_root)));
        assert!(cache.contains(&(Epoch::new(3), head_root)));
        assert!(cache.contains(&(Epoch::new(4), Hash256::ZERO)));
    }

    #[test]
    fn only_head_keys_are_protected() {
        let head_root = Hash256::repeat_byte(7);
        let protector = ProposerProtector::new(BlockShufflingIds::new(head_root, Epoch::new(2)));

        assert!(protector.protect_from_eviction(&(Epoch::new(2), head_root)));
        assert!(protector.protect_from_eviction(&(Epoch::new(3), head_root)));
        assert!(!protector.protect_from_eviction(&(Epoch::new(4), head_root)));
        assert!(!protector.protect_from_eviction(&(Epoch::new(2), Hash256::ZERO)));
    }

    #[test]
    fn first_value_wins() {
        let head_ids = BlockShufflingIds::new(Hash256::ZERO, Epoch::new(0));
        let mut cache: BeaconProposerCache =
            PromiseCache::new(4, ProposerProtector::new(head_ids), test_logger());
        let key = (Epoch::new(0), Hash256::ZERO);

        cache.insert_value(key, Arc::new(vec![1]));
        cache.insert_value(key, Arc::new(vec![2]));

        assert_eq!(*cache.get(&key).unwrap().wait().unwrap(), vec![1]);
    }
}
