//! Process-lifetime validation metrics.
//!
//! A single aggregate mutated under lock on every validation call and read
//! without mutation for reporting. Rate-limit denials are tracked by their own
//! counter, distinct from normal validation failures; cache-served calls are
//! counted as validations and additionally tallied as cached serves.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::time::Duration;

use crate::types::{now_unix_ms, PayloadKind};

#[derive(Debug, Default)]
struct MetricsInner {
    total: u64,
    success: u64,
    failure: u64,
    by_kind: HashMap<PayloadKind, u64>,
    errors_by_kind: HashMap<PayloadKind, u64>,
    avg_latency: Duration,
    rate_limit_hits: u64,
    cached_serves: u64,
    last_updated_ms: u64,
}

/// Aggregated counters across all validation calls.
pub struct GatewayMetrics {
    inner: RwLock<MetricsInner>,
}

impl GatewayMetrics {
    /// Create an empty aggregate.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MetricsInner::default()),
        }
    }

    /// Record one completed validation call.
    pub fn record_validation(&self, kind: PayloadKind, valid: bool, cached: bool, duration: Duration) {
        let mut inner = self.inner.write();

        inner.total += 1;
        *inner.by_kind.entry(kind).or_insert(0) += 1;
        if valid {
            inner.success += 1;
        } else {
            inner.failure += 1;
            *inner.errors_by_kind.entry(kind).or_insert(0) += 1;
        }
        if cached {
            inner.cached_serves += 1;
        }

        // Incremental moving average over all calls
        let n = inner.total;
        let prev = inner.avg_latency.as_nanos() as u64;
        let avg = prev
            .saturating_mul(n - 1)
            .saturating_add(duration.as_nanos() as u64)
            / n;
        inner.avg_latency = Duration::from_nanos(avg);
        inner.last_updated_ms = now_unix_ms();
    }

    /// Record a rate-limit denial (not counted as a normal failure).
    pub fn record_rate_limit_hit(&self) {
        let mut inner = self.inner.write();
        inner.rate_limit_hits += 1;
        inner.last_updated_ms = now_unix_ms();
    }

    /// Read-only aggregate view.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.read();
        let success_rate = if inner.total > 0 {
            inner.success as f64 / inner.total as f64
        } else {
            0.0
        };
        MetricsSnapshot {
            total_validations: inner.total,
            successful_validations: inner.success,
            failed_validations: inner.failure,
            success_rate,
            average_latency_ms: inner.avg_latency.as_secs_f64() * 1000.0,
            validations_by_kind: to_named(&inner.by_kind),
            errors_by_kind: to_named(&inner.errors_by_kind),
            rate_limit_hits: inner.rate_limit_hits,
            cached_serves: inner.cached_serves,
            cache_hits: 0,
            cache_misses: 0,
            cache_hit_rate: 0.0,
            cache_entries: 0,
            tracked_clients: 0,
            last_updated_ms: inner.last_updated_ms,
        }
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn to_named(map: &HashMap<PayloadKind, u64>) -> BTreeMap<String, u64> {
    map.iter()
        .map(|(kind, count)| (kind.as_str().to_string(), *count))
        .collect()
}

/// Serializable aggregate view of gateway activity.
///
/// Cache and rate-limiter occupancy figures are filled in by the gateway,
/// which owns those structures.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_validations: u64,
    pub successful_validations: u64,
    pub failed_validations: u64,
    pub success_rate: f64,
    pub average_latency_ms: f64,
    pub validations_by_kind: BTreeMap<String, u64>,
    pub errors_by_kind: BTreeMap<String, u64>,
    pub rate_limit_hits: u64,
    pub cached_serves: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub cache_entries: usize,
    pub tracked_clients: usize,
    pub last_updated_ms: u64,
}
