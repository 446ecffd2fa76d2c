//! Caches the committee shuffling of an epoch, keyed by `ShufflingId`.
//!
//! A shuffling that is being computed is represented by a promise, so concurrent requests for the
//! same epoch compute it once. See `BeaconChain::with_committee_cache`.
use promise_cache::{PromiseCache, Protect};
use slog::{debug, Logger};
use types::{CommitteeCache, Epoch, Hash256, ShufflingId};

/// Provides a promise cache of `CommitteeCache`s.
///
/// It has been named `ShufflingCache` because `CommitteeCacheCache` is a bit weird and looks like
/// a find/replace error.
pub type ShufflingCache = PromiseCache<ShufflingId, CommitteeCache, ShufflingProtector>;

/// Evicts the shufflings of the oldest epochs first and never evicts those of the head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShufflingProtector {
    head_shuffling_ids: BlockShufflingIds,
}

impl ShufflingProtector {
    pub fn new(head_shuffling_ids: BlockShufflingIds) -> Self {
        Self { head_shuffling_ids }
    }
}

impl Protect<ShufflingId> for ShufflingProtector {
    type SortKey = Epoch;

    fn sort_key(&self, k: &ShufflingId) -> Epoch {
        k.shuffling_epoch
    }

    fn protect_from_eviction(&self, k: &ShufflingId) -> bool {
        self.head_shuffling_ids.contains(k)
    }

    fn notify_eviction(&self, k: &ShufflingId, log: &Logger) {
        debug!(
            log,
            "Removing shuffling from cache";
            "shuffling_epoch" => %k.shuffling_epoch,
            "shuffling_decision_block" => ?k.shuffling_decision_block,
        );
    }
}

/// Contains the shuffling IDs for a beacon block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockShufflingIds {
    pub current: ShufflingId,
    pub next: ShufflingId,
    pub block_root: Hash256,
}

impl BlockShufflingIds {
    /// The shufflings of the current and next epoch of a state, as decided by the block with root
    /// `block_root`.
    pub fn new(block_root: Hash256, current_epoch: Epoch) -> Self {
        Self {
            current: ShufflingId::from_components(current_epoch, block_root),
            next: ShufflingId::from_components(current_epoch + 1, block_root),
            block_root,
        }
    }

    /// Returns the shuffling ID for the given epoch.
    ///
    /// Returns `None` if `epoch` is neither the current nor the next epoch.
    pub fn id_for_epoch(&self, epoch: Epoch) -> Option<ShufflingId> {
        if epoch == self.current.shuffling_epoch {
            Some(self.current)
        } else if epoch == self.next.shuffling_epoch {
            Some(self.next)
        } else {
            None
        }
    }

    pub fn contains(&self, shuffling_id: &ShufflingId) -> bool {
        self.current == *shuffling_id || self.next == *shuffling_id
    }
}
