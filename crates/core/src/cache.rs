//! Time-boxed memoization shared by the resolvers.
//!
//! Entries are keyed by an opaque identity string. A live entry (younger than
//! the ttl passed by the caller) is served without touching the producer. An
//! expired entry is treated as absent. Concurrent misses on the same key are
//! collapsed onto one pending fetch, so a producer runs at most once per key
//! per ttl window.
use std::{
    collections::HashMap,
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use futures::{
    FutureExt as _,
    future::{BoxFuture, Shared},
};
use tokio::{sync::Mutex, time::Instant};
use tracing::trace;

use crate::error::FetchError;

type PendingFetch<V> = Shared<BoxFuture<'static, Result<V, FetchError>>>;

enum Slot<V> {
    Ready { value: V, fetched_at: Instant },
    Pending { id: u64, fetch: PendingFetch<V> },
}

pub struct TtlCache<V> {
    slots: Mutex<HashMap<String, Slot<V>>>,
    next_fetch_id: AtomicU64,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            next_fetch_id: AtomicU64::new(0),
        }
    }

    /// Returns the live value for `key` or runs `producer` to obtain one.
    ///
    /// Failures are handed back to every waiter and are not cached.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<V, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let (id, fetch) = {
            let mut slots = self.slots.lock().await;
            let in_flight = match slots.get(key) {
                Some(Slot::Ready { value, fetched_at }) if fetched_at.elapsed() < ttl => {
                    trace!(cache.key = key, "serving live cache entry");
                    return Ok(value.clone());
                }
                Some(Slot::Pending { id, fetch }) => Some((*id, fetch.clone())),
                _ => None,
            };

            match in_flight {
                Some(joined) => {
                    trace!(cache.key = key, "joining in-flight fetch");
                    joined
                }
                None => {
                    let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                    let fetch = producer().boxed().shared();
                    slots.insert(
                        key.to_string(),
                        Slot::Pending {
                            id,
                            fetch: fetch.clone(),
                        },
                    );
                    (id, fetch)
                }
            }
        };

        let result = fetch.await;

        // every waiter tries to commit; only the first one still sees its pending slot
        let mut slots = self.slots.lock().await;
        if matches!(slots.get(key), Some(Slot::Pending { id: pending, .. }) if *pending == id) {
            match &result {
                Ok(value) => {
                    slots.insert(
                        key.to_string(),
                        Slot::Ready {
                            value: value.clone(),
                            fetched_at: Instant::now(),
                        },
                    );
                }
                Err(_) => {
                    slots.remove(key);
                }
            }
        }

        result
    }

    /// Drops the entry for `key`, live or not.
    pub async fn invalidate(&self, key: &str) {
        self.slots.lock().await.remove(key);
    }
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
