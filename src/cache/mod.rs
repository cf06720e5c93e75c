//! Keyed entity cache with in-flight request deduplication.
//!
//! [`KeyedCache`] backs the resource stores. Each key owns one slot that
//! is either a resolved value or a pending fetch shared by every caller
//! that asked while it was in flight. The dedup protocol lives in
//! [`KeyedCache::get_or_fetch`]: probe, join, or register, all under one
//! lock, so two concurrent callers can never start two remote calls for
//! the same key.
//!
//! There is no automatic expiry. Stores invalidate explicitly: a FULL
//! write supersedes the BASIC entry of the same resource, deletes drop
//! both views, failed fetches clear their slot so a later call retries.
//!
//! Writes are last-writer-wins. An explicit [`set_entity`] replaces
//! whatever the slot holds, including a pending fetch; when that fetch
//! settles it writes again, and the later write stands.
//!
//! [`set_entity`]: KeyedCache::set_entity

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use crate::Result;
use crate::telemetry;

/// Handle to an in-flight fetch. Cloning and awaiting joins the fetch;
/// every joiner receives the same resolved value or the same error.
pub type SharedRequest<V> = Shared<BoxFuture<'static, Result<V>>>;

/// One cache slot: a settled value or a fetch still in flight.
enum Slot<V> {
    Resolved(V),
    Pending(SharedRequest<V>),
}

/// Entity cache keyed by composite, order-sensitive keys.
///
/// Cheap to clone; clones share the same slot map. One instance per
/// store, named for the telemetry `cache` label.
pub struct KeyedCache<K, V> {
    name: &'static str,
    slots: Arc<Mutex<HashMap<K, Slot<V>>>>,
}

impl<K, V> Clone for KeyedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<K, V> KeyedCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty cache. `name` labels its telemetry counters.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store a resolved value, replacing whatever the slot holds.
    pub fn set_entity(&self, key: K, value: V) {
        self.slots.lock().insert(key, Slot::Resolved(value));
    }

    /// Read a resolved value. Pending slots read as `None`.
    pub fn get_entity(&self, key: &K) -> Option<V> {
        match self.slots.lock().get(key) {
            Some(Slot::Resolved(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Register an in-flight fetch for a key with no resolved value.
    /// A resolved entry is not displaced.
    ///
    /// The future is driven by whoever awaits the handle;
    /// [`get_or_fetch`](Self::get_or_fetch) additionally spawns a driver
    /// task so the fetches it registers always settle.
    pub fn set_request(&self, key: K, request: SharedRequest<V>) {
        let mut slots = self.slots.lock();
        match slots.get(&key) {
            Some(Slot::Resolved(_)) => {}
            _ => {
                slots.insert(key, Slot::Pending(request));
            }
        }
    }

    /// Clone the in-flight fetch handle, if the slot is pending.
    pub fn get_request(&self, key: &K) -> Option<SharedRequest<V>> {
        match self.slots.lock().get(key) {
            Some(Slot::Pending(request)) => Some(request.clone()),
            _ => None,
        }
    }

    /// Remove the slot if it holds a resolved value.
    pub fn invalidate_entity(&self, key: &K) {
        let mut slots = self.slots.lock();
        if let Some(Slot::Resolved(_)) = slots.get(key) {
            slots.remove(key);
        }
    }

    /// Remove the slot if it holds a pending fetch.
    pub fn invalidate_request(&self, key: &K) {
        let mut slots = self.slots.lock();
        if let Some(Slot::Pending(_)) = slots.get(key) {
            slots.remove(key);
        }
    }

    /// The dedup protocol: return the resolved value, join the pending
    /// fetch, or register `fetch` and await it.
    ///
    /// A registered fetch settles the cache itself: on success it
    /// stores the value and runs `write_back` (the supersession hook),
    /// on failure it clears the slot so a later call can retry. A
    /// detached driver task keeps it running even if every awaiter is
    /// dropped mid-flight.
    ///
    /// # Panics
    ///
    /// Requires a tokio runtime context (called within an async fn).
    pub async fn get_or_fetch<F, W>(&self, key: K, fetch: F, write_back: W) -> Result<V>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V>>,
        W: FnOnce(&V) + Send + 'static,
    {
        let (request, created) = {
            let mut slots = self.slots.lock();
            match slots.entry(key) {
                Entry::Occupied(entry) => match entry.get() {
                    Slot::Resolved(value) => {
                        metrics::counter!(telemetry::CACHE_HITS_TOTAL, "cache" => self.name)
                            .increment(1);
                        return Ok(value.clone());
                    }
                    Slot::Pending(request) => {
                        metrics::counter!(telemetry::CACHE_JOINS_TOTAL, "cache" => self.name)
                            .increment(1);
                        (request.clone(), false)
                    }
                },
                Entry::Vacant(entry) => {
                    metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "cache" => self.name)
                        .increment(1);
                    let cache = self.clone();
                    let key = entry.key().clone();
                    let fut = fetch();
                    let request = async move {
                        match fut.await {
                            Ok(value) => {
                                cache.set_entity(key, value.clone());
                                write_back(&value);
                                Ok(value)
                            }
                            Err(error) => {
                                cache.invalidate_request(&key);
                                Err(error)
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    entry.insert(Slot::Pending(request.clone()));
                    (request, true)
                }
            }
        };
        if created {
            tokio::spawn(request.clone().map(|_| ()));
        }
        request.await
    }
}
