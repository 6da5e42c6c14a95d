//! Time-boxed validation result cache.
//!
//! Bounded cache keyed by a deterministic digest of request shape, so
//! structurally identical requests collide regardless of arrival order.
//! Entries expire lazily on lookup (no background sweeper) and the oldest
//! insertion is evicted when the cache is full. Only valid results are ever
//! stored: invalid input is often a one-off attacker probe, and caching it
//! would spend memory for no benefit.
//!
//! Lookups vastly outnumber writes, so the map sits behind a reader/writer
//! lock with an atomic hit/miss tally beside it.

use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use xxhash_rust::xxh3::xxh3_64;

use crate::types::{PayloadKind, ValidationResult};

/// A cached validation result.
#[derive(Debug, Clone)]
struct CacheEntry {
    result: ValidationResult,
    inserted_at: Instant,
    ttl: Duration,
}

/// Bounded, time-boxed cache of validation results.
pub struct ValidationCache {
    entries: RwLock<HashMap<u64, CacheEntry>>,
    max_entries: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ValidationCache {
    /// Create a cache holding at most `max_entries` results for `ttl` each.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        debug!(
            max_entries = max_entries,
            ttl_secs = ttl.as_secs(),
            "Creating validation cache"
        );
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Deterministic digest over request shape.
    ///
    /// serde_json's object map is ordered, so two payloads that differ only
    /// in key insertion order serialize identically and share a key.
    pub fn key(kind: PayloadKind, payload: &Value, schema: Option<&Value>) -> u64 {
        let canonical = json!({
            "kind": kind.as_str(),
            "data": payload,
            "schema": schema,
        });
        xxh3_64(canonical.to_string().as_bytes())
    }

    /// Look up a result, expiring a stale entry on the way.
    pub fn get(&self, key: u64) -> Option<ValidationResult> {
        {
            let entries = self.entries.read();
            match entries.get(&key) {
                None => {}
                Some(entry) if entry.inserted_at.elapsed() <= entry.ttl => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    trace!(key = key, "Validation cache hit");
                    return Some(entry.result.clone());
                }
                Some(_) => {
                    // Stale: fall through to delete under the write lock
                }
            }
        }

        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(&key) {
            if entry.inserted_at.elapsed() > entry.ttl {
                entries.remove(&key);
                trace!(key = key, "Expired stale cache entry");
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a valid result, evicting the oldest insertion at capacity.
    ///
    /// Invalid results are refused outright; the only-valid-results invariant
    /// is enforced here, not just at the call site.
    pub fn set(&self, key: u64, result: ValidationResult) {
        if !result.valid {
            trace!(key = key, "Refusing to cache invalid result");
            return;
        }

        let mut entries = self.entries.write();
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(key, _)| *key);
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                trace!(evicted = oldest, "Evicted oldest cache entry");
            }
        }
        entries.insert(
            key,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
                ttl: self.ttl,
            },
        );
    }

    /// Cache hit rate in `[0.0, 1.0]`.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let misses = self.misses.load(Ordering::Relaxed) as f64;
        let total = hits + misses;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }

    /// Lifetime hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lifetime miss count.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of live entries (stale entries count until a lookup expires them).
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
