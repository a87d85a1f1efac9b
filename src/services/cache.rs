//! In-memory TTL cache with single-flight loading
//!
//! Concurrent misses on the same key run the loader once; the other callers
//! wait and read the stored value. Loader failures are returned to every
//! waiter in turn and never cached.

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    cached_at: DateTime<Utc>,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    flights: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any
    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// When the fresh value for `key` was stored
    pub async fn cached_at(&self, key: &str) -> Option<DateTime<Utc>> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.cached_at)
    }

    /// Store `value` under `key`. Expired entries are evicted on the way in.
    pub async fn insert(&self, key: &str, value: V) {
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            cached_at: Utc::now(),
            expires_at: now + self.ttl,
        };

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(key.to_string(), entry);
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Drop expired entries, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of fresh entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|entry| entry.expires_at > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Return the fresh value for `key`, or run `load` once and store its result
    pub async fn get_or_try_insert_with<F, Fut>(&self, key: &str, load: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.get(key).await {
            debug!(key, "Cache hit");
            return Ok(value);
        }

        let flight = {
            let mut flights = self.flights.lock().await;
            Arc::clone(flights.entry(key.to_string()).or_default())
        };
        let guard = flight.lock().await;

        // Another caller may have filled it while we waited
        let result = match self.get(key).await {
            Some(value) => {
                debug!(key, "Cache filled by concurrent loader");
                Ok(value)
            }
            None => {
                debug!(key, "Cache miss, loading");
                match load().await {
                    Ok(value) => {
                        self.insert(key, value.clone()).await;
                        Ok(value)
                    }
                    Err(e) => Err(e),
                }
            }
        };

        drop(guard);
        self.release_flight(key, flight).await;
        result
    }

    /// Drop the per-key flight lock once no other caller holds it
    async fn release_flight(&self, key: &str, flight: Arc<Mutex<()>>) {
        let mut flights = self.flights.lock().await;
        let idle = flights
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, &flight) && Arc::strong_count(&flight) == 2);
        if idle {
            flights.remove(key);
        }
    }

    #[cfg(test)]
    async fn flight_count(&self) -> usize {
        self.flights.lock().await.len()
    }

    #[cfg(test)]
    async fn stored_count(&self) -> usize {
        self.entries.read().await.len()
    }
}
