//! Holds the head of the chain that duties are served from.
//!
//! The head is an immutable `Arc<BeaconSnapshot>`. Readers clone the `Arc` and release the lock
//! straight away, so a head update never waits on a long-running duties request.
use crate::shuffling_cache::BlockShufflingIds;
use crate::BeaconChainError;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use types::{BeaconState, Epoch, EthSpec, Hash256};

/// The time to wait for the head lock before giving up.
pub const HEAD_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// A block root and the state it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconSnapshot<E: EthSpec> {
    pub beacon_block_root: Hash256,
    pub beacon_state: BeaconState<E>,
}

impl<E: EthSpec> BeaconSnapshot<E> {
    pub fn new(beacon_block_root: Hash256, beacon_state: BeaconState<E>) -> Self {
        Self {
            beacon_block_root,
            beacon_state,
        }
    }

    pub fn current_epoch(&self) -> Epoch {
        self.beacon_state.current_epoch()
    }

    /// The shufflings that can be served from this snapshot.
    ///
    /// The head block decides both shufflings: serving other heads is left to the caller.
    pub fn shuffling_ids(&self) -> BlockShufflingIds {
        BlockShufflingIds::new(self.beacon_block_root, self.current_epoch())
    }
}

pub struct CanonicalHead<E: EthSpec> {
    snapshot: RwLock<Arc<BeaconSnapshot<E>>>,
}

impl<E: EthSpec> CanonicalHead<E> {
    pub fn new(snapshot: BeaconSnapshot<E>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Returns the current head.
    ///
    /// The returned snapshot stays valid (though possibly stale) after the head is updated.
    pub fn cached_head(&self) -> Result<Arc<BeaconSnapshot<E>>, BeaconChainError> {
        self.snapshot
            .try_read_for(HEAD_LOCK_TIMEOUT)
            .map(|head| head.clone())
            .ok_or(BeaconChainError::UnableToReadHead)
    }

    /// Replace the head, returning the previous one.
    pub fn replace(
        &self,
        snapshot: BeaconSnapshot<E>,
    ) -> Result<Arc<BeaconSnapshot<E>>, BeaconChainError> {
        let mut head = self
            .snapshot
            .try_write_for(HEAD_LOCK_TIMEOUT)
            .ok_or(BeaconChainError::UnableToReadHead)?;
        Ok(std::mem::replace(&mut *head, Arc::new(snapshot)))
    }
}
