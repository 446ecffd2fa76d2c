//! A cache of values which are expensive to compute, where a value that is currently being
//! computed is represented by a "promise" that other threads can wait on.
//!
//! The intended usage is:
//!
//! 1. Take a write-lock on the cache and call `get`.
//! 2. On a hit, drop the lock and `wait` on the returned `CacheItem`.
//! 3. On a miss, call `create_promise` *whilst still holding the lock*, drop the lock, compute the
//!    value and finally call `resolve_promise`.
//!
//! If the computation fails the `Sender` should simply be dropped. Waiting threads will receive
//! an error and the promise is removed from the cache the next time it is accessed, so a failure
//! is never cached.
use derivative::Derivative;
use itertools::Itertools;
use oneshot_broadcast::{oneshot, Receiver, Sender};
use slog::{debug, Logger};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

#[derive(Debug)]
pub struct PromiseCache<K, V, P>
where
    K: Hash + Eq + Clone,
    P: Protect<K>,
{
    cache: HashMap<K, CacheItem<V>>,
    capacity: usize,
    protector: P,
    max_concurrent_promises: usize,
    log: Logger,
}

/// Decides which keys may be evicted, and in which order.
pub trait Protect<K> {
    type SortKey: Ord;

    /// Keys with the lowest sort key are evicted first.
    fn sort_key(&self, k: &K) -> Self::SortKey;

    fn protect_from_eviction(&self, k: &K) -> bool;

    fn notify_eviction(&self, _k: &K, _log: &Logger) {}
}

#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub enum CacheItem<T> {
    Complete(Arc<T>),
    Promise(Receiver<Arc<T>>),
}

impl<T> std::fmt::Debug for CacheItem<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheItem::Complete(_) => f.write_str("Complete(..)"),
            CacheItem::Promise(_) => f.write_str("Promise(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseCacheError {
    /// The thread computing the value failed before resolving the promise.
    Failed(oneshot_broadcast::Error),
    /// Too many values are being computed concurrently.
    MaxConcurrentPromises(usize),
}

impl<T> CacheItem<T> {
    pub fn is_promise(&self) -> bool {
        matches!(self, CacheItem::Promise(_))
    }

    /// Return the value, blocking the current thread until it is available if `self` is a
    /// promise.
    pub fn wait(self) -> Result<Arc<T>, PromiseCacheError> {
        match self {
            CacheItem::Complete(value) => Ok(value),
            CacheItem::Promise(receiver) => receiver.recv().map_err(PromiseCacheError::Failed),
        }
    }
}

impl<K, V, P> PromiseCache<K, V, P>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
    P: Protect<K>,
{
    pub fn new(capacity: usize, protector: P, log: Logger) -> Self {
        // Derived from the capacity rather than configured separately.
        let max_concurrent_promises = std::cmp::max(2, capacity / 8);
        Self {
            cache: HashMap::new(),
            capacity,
            protector,
            max_concurrent_promises,
            log,
        }
    }

    /// Returns the item for `key`, which is either a complete value or a promise that the caller
    /// may wait on.
    ///
    /// Returns `None` if the value is not present, or if it was promised but the computing thread
    /// failed. In the latter case the stale promise is removed so the caller may recompute.
    pub fn get(&mut self, key: &K) -> Option<CacheItem<V>> {
        match self.cache.get(key) {
            item @ Some(CacheItem::Complete(_)) => item.cloned(),
            item @ Some(CacheItem::Promise(receiver)) => match receiver.try_recv() {
                Ok(Some(value)) => {
                    let ready = CacheItem::Complete(value);
                    self.insert_cache_item(key.clone(), ready.clone());
                    Some(ready)
                }
                Ok(None) => item.cloned(),
                Err(oneshot_broadcast::Error::SenderDropped) => {
                    debug!(
                        self.log,
                        "Removing failed promise";
                        "key" => ?key,
                    );
                    self.cache.remove(key);
                    None
                }
            },
            None => None,
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.cache.contains_key(key)
    }

    /// Insert a complete value, replacing any promise for the same key.
    pub fn insert_value(&mut self, key: K, value: Arc<V>) {
        if self
            .cache
            .get(&key)
            .map_or(true, CacheItem::is_promise)
        {
            self.insert_cache_item(key, CacheItem::Complete(value));
        }
    }

    /// Deliver `value` to all threads waiting on the promise for `key` and store it in the cache
    /// for future callers.
    pub fn resolve_promise(&mut self, sender: Sender<Arc<V>>, key: K, value: Arc<V>) {
        sender.send(value.clone());
        // The promise may have been evicted in the meantime; a freshly computed value is still
        // worth keeping.
        self.insert_value(key, value);
    }

    /// Register that the value for `key` is being computed.
    ///
    /// Must be called whilst holding the same lock that was used for the `get` which missed,
    /// otherwise two threads may compute the same value.
    pub fn create_promise(&mut self, key: K) -> Result<Sender<Arc<V>>, PromiseCacheError> {
        let active_promises = self.cache.values().filter(|item| item.is_promise()).count();
        if active_promises >= self.max_concurrent_promises {
            return Err(PromiseCacheError::MaxConcurrentPromises(active_promises));
        }

        let (sender, receiver) = oneshot();
        self.insert_cache_item(key, CacheItem::Promise(receiver));
        Ok(sender)
    }

    fn insert_cache_item(&mut self, key: K, cache_item: CacheItem<V>) {
        if !self.cache.contains_key(&key) {
            self.prune_cache();
        }
        self.cache.insert(key, cache_item);
    }

    /// Make room for one more item.
    fn prune_cache(&mut self) {
        let target_cache_size = self.capacity.saturating_sub(1);
        if let Some(prune_count) = self.cache.len().checked_sub(target_cache_size) {
            let keys_to_prune = self
                .cache
                .keys()
                .filter(|k| !self.protector.protect_from_eviction(k))
                .sorted_by_key(|k| self.protector.sort_key(k))
                .take(prune_count)
                .cloned()
                .collect::<Vec<_>>();

            for key in &keys_to_prune {
                self.protector.notify_eviction(key, &self.log);
                self.cache.remove(key);
            }
        }
    }

    pub fn update_protector(&mut self, protector: P) {
        self.protector = protector;
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn max_concurrent_promises(&self) -> usize {
        self.max_concurrent_promises
    }
}
