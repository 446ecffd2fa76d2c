use std::sync::atomic::{AtomicBool, Ordering};

/// Reports whether the node is still catching up with the network.
///
/// While syncing the head is stale, so duties derived from it would be wrong.
pub trait SyncStatus: Send + Sync + 'static {
    fn is_syncing(&self) -> bool;
}

/// A `SyncStatus` that is set by hand, by the sync service or in tests.
#[derive(Debug, Default)]
pub struct ManualSyncStatus {
    syncing: AtomicBool,
}

impl ManualSyncStatus {
    pub fn new(syncing: bool) -> Self {
        Self {
            syncing: AtomicBool::new(syncing),
        }
    }

    pub fn set_syncing(&self, syncing: bool) {
        self.syncing.store(syncing, Ordering::Relaxed);
    }
}

impl SyncStatus for ManualSyncStatus {
    fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Relaxed)
    }
}
