//! Per-client rate limiting.
//!
//! Sliding-window counter with temporary block-out: once a client exceeds its
//! budget it is denied until a full window has passed, rather than being
//! re-admitted the instant the window rolls. The block-out keeps a client from
//! probing the exact window boundary to exceed the intended rate.
//!
//! Counters live in a concurrent map keyed by client identifier; the map's
//! per-entry locking keeps counting strictly ordered for any single client
//! while requests from different clients proceed in parallel. Idle entries are
//! swept so the map cannot grow without bound under client-identifier churn.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Per-client rate-limit state.
#[derive(Debug)]
struct ClientCounter {
    /// Requests seen in the current window
    count: u32,
    /// Start of the current window
    window_start: Instant,
    /// Whether the client is currently blocked out
    blocked: bool,
    /// When the block-out lifts
    blocked_until: Option<Instant>,
    /// Last time this client was seen at all (for the idle sweep)
    last_seen: Instant,
}

impl ClientCounter {
    fn new(now: Instant) -> Self {
        Self {
            count: 1,
            window_start: now,
            blocked: false,
            blocked_until: None,
            last_seen: now,
        }
    }
}

/// Sliding-window rate limiter with block-out.
pub struct SlidingWindowLimiter {
    clients: DashMap<String, ClientCounter>,
    limit: u32,
    window: Duration,
    max_clients: usize,
}

impl SlidingWindowLimiter {
    /// Create a limiter allowing `limit` requests per client per `window`.
    ///
    /// `max_clients` bounds the tracked-client map: when exceeded, an idle
    /// sweep runs before admitting the new client.
    pub fn new(limit: u32, window: Duration, max_clients: usize) -> Self {
        trace!(
            limit = limit,
            window_secs = window.as_secs(),
            max_clients = max_clients,
            "Creating sliding-window rate limiter"
        );
        Self {
            clients: DashMap::new(),
            limit,
            window,
            max_clients,
        }
    }

    /// Check whether a request from `client_id` is allowed.
    ///
    /// First sight of a client opens a window with count 1. A blocked client
    /// is denied without touching its counter until the block lifts. An
    /// elapsed window resets the counter. Exceeding the limit blocks the
    /// client for one full window from now.
    pub fn allow(&self, client_id: &str) -> bool {
        let now = Instant::now();

        // Keep the map bounded before inserting new clients. Done outside the
        // entry lock: dashmap deadlocks if retain runs under an entry guard.
        if self.clients.len() >= self.max_clients && !self.clients.contains_key(client_id) {
            self.sweep_idle(self.window);
        }

        match self.clients.entry(client_id.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(ClientCounter::new(now));
                true
            }
            Entry::Occupied(mut occupied) => {
                let counter = occupied.get_mut();
                counter.last_seen = now;

                if counter.blocked {
                    if let Some(until) = counter.blocked_until {
                        if now < until {
                            trace!(client_id = %client_id, "Client is blocked out");
                            return false;
                        }
                    }
                }

                if now.duration_since(counter.window_start) > self.window {
                    counter.count = 1;
                    counter.window_start = now;
                    counter.blocked = false;
                    counter.blocked_until = None;
                    return true;
                }

                counter.count += 1;
                if counter.count > self.limit {
                    counter.blocked = true;
                    counter.blocked_until = Some(now + self.window);
                    warn!(
                        client_id = %client_id,
                        count = counter.count,
                        limit = self.limit,
                        "Client exceeded rate limit, blocking for one window"
                    );
                    return false;
                }

                true
            }
        }
    }

    /// Remove counters idle longer than `max_age`.
    ///
    /// Returns the number of entries removed. Any counter idle beyond the
    /// window is semantically reset anyway, so removal never changes an
    /// outcome; callers may also invoke this on a timer.
    pub fn sweep_idle(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let before = self.clients.len();
        self.clients
            .retain(|_, counter| now.duration_since(counter.last_seen) < max_age);
        let removed = before - self.clients.len();
        if removed > 0 {
            debug!(
                removed = removed,
                remaining = self.clients.len(),
                "Swept idle rate-limit counters"
            );
        }
        removed
    }

    /// Number of distinct clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}
