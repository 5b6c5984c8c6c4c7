//! Tiered result cache keyed by query signature.
//!
//! Lookups hit an in-process map first, then the persisted store; a disk
//! hit rehydrates the map. Writes always land in the map, while disk
//! writes are best-effort: on a quota error the oldest 20% of entries are
//! evicted and the write retried once, then dropped with a warning. The
//! request path never fails because the disk tier did.
//!
//! Per-signature generations make late writes safe to discard: a caller
//! captures a token with `begin`, and `put_if_current` is a no-op once the
//! signature has been superseded (e.g. the UI abandoned the request).

use crate::domain::{Clock, KvStore};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// TTLs per payload kind.
pub mod ttl {
    /// Product-list entries.
    pub const PRODUCTS_SECS: i64 = 300;
    /// Taxonomy snapshots.
    pub const TAXONOMY_SECS: i64 = 1800;
}

/// Fraction of persisted entries purged when the store hits its ceiling.
const EVICTION_FRACTION: f64 = 0.2;

struct MemEntry {
    payload: String,
    written_at: i64,
}

/// Cache usage counters exposed at `/v1/api/catalog/cache/stats`.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub memory_entries: usize,
}

pub struct CacheService {
    memory: Mutex<HashMap<String, MemEntry>>,
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    generations: Mutex<HashMap<String, u64>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheService {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            store,
            clock,
            generations: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Capture the current generation for a signature. Pass the token back
    /// to `put_if_current` after the fetch completes.
    pub fn begin(&self, signature: &str) -> u64 {
        let generations = self.generations.lock().expect("generations lock");
        generations.get(signature).copied().unwrap_or(0)
    }

    /// Invalidate all in-flight writes for a signature. Late responses for
    /// abandoned requests then fall on the floor instead of poisoning the
    /// cache.
    pub fn supersede(&self, signature: &str) {
        let mut generations = self.generations.lock().expect("generations lock");
        *generations.entry(signature.to_string()).or_insert(0) += 1;
    }

    /// Look up a fresh entry, memory first, then the persisted store.
    pub fn get<T: DeserializeOwned>(&self, signature: &str, ttl_secs: i64) -> Option<T> {
        self.get_aged(signature, ttl_secs).map(|(payload, _)| payload)
    }

    /// Like `get`, but also returns the entry's write timestamp so callers
    /// with their own freshness windows (the taxonomy snapshot) can keep
    /// honest TTL accounting.
    pub fn get_aged<T: DeserializeOwned>(
        &self,
        signature: &str,
        ttl_secs: i64,
    ) -> Option<(T, i64)> {
        let now = self.clock.now_unix();

        {
            let memory = self.memory.lock().expect("memory lock");
            if let Some(entry) = memory.get(signature) {
                if now - entry.written_at < ttl_secs {
                    if let Ok(payload) = serde_json::from_str::<T>(&entry.payload) {
                        debug!(signature, "memory cache hit");
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        metrics::counter!("cache_hits_total", "tier" => "memory").increment(1);
                        return Some((payload, entry.written_at));
                    }
                }
            }
        }

        match self.store.get(signature) {
            Ok(Some(stored)) if now - stored.written_at < ttl_secs => {
                if let Ok(payload) = serde_json::from_str::<T>(&stored.value) {
                    debug!(signature, "persisted cache hit");
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!("cache_hits_total", "tier" => "disk").increment(1);

                    // Rehydrate the fast tier for subsequent lookups.
                    let mut memory = self.memory.lock().expect("memory lock");
                    memory.insert(
                        signature.to_string(),
                        MemEntry {
                            payload: stored.value,
                            written_at: stored.written_at,
                        },
                    );
                    return Some((payload, stored.written_at));
                }
            }
            Ok(_) => {}
            Err(err) => warn!(signature, "persisted cache read failed: {err:#}"),
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("cache_misses_total").increment(1);
        None
    }

    /// Store a payload under a signature in both tiers.
    pub fn put<T: Serialize>(&self, signature: &str, payload: &T) {
        let json = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(err) => {
                warn!(signature, "cache serialization failed: {err}");
                return;
            }
        };
        let now = self.clock.now_unix();

        {
            let mut memory = self.memory.lock().expect("memory lock");
            memory.insert(
                signature.to_string(),
                MemEntry {
                    payload: json.clone(),
                    written_at: now,
                },
            );
        }

        self.persist(signature, &json, now);
    }

    /// Store a payload only when the signature has not been superseded
    /// since `token` was captured. Returns whether the write happened.
    pub fn put_if_current<T: Serialize>(&self, signature: &str, payload: &T, token: u64) -> bool {
        let current = self.begin(signature);
        if current != token {
            debug!(signature, token, current, "discarding stale cache write");
            return false;
        }
        self.put(signature, payload);
        true
    }

    /// Best-effort disk write with a single evict-and-retry.
    fn persist(&self, signature: &str, json: &str, now: i64) {
        if self.store.set(signature, json, now).is_ok() {
            return;
        }
        match self.store.evict_oldest(EVICTION_FRACTION) {
            Ok(evicted) => debug!(signature, evicted, "evicted persisted cache entries"),
            Err(err) => warn!(signature, "persisted cache eviction failed: {err:#}"),
        }
        if let Err(err) = self.store.set(signature, json, now) {
            warn!(signature, "persisted cache write dropped: {err:#}");
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            memory_entries: self.memory.lock().expect("memory lock").len(),
        }
    }
}
