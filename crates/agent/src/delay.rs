//! Cache for keepalive probe results.
//!
//! Keepalive hooks are external HTTP calls; probing them on every event in
//! every tick would hammer the guarded services. Results are cached for a
//! fixed interval and re-probed lazily after expiry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

pub(crate) const KEEPALIVE_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct CacheEntry {
    expires: Instant,
    alive: bool,
}

#[derive(Debug)]
pub(crate) struct DelayCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl DelayCache {
    pub(crate) fn new(ttl: Duration) -> DelayCache {
        DelayCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Cached probe result for `id`, or `None` when absent or expired.
    pub(crate) fn get(&self, id: &str) -> Option<bool> {
        self.entries
            .get(id)
            .filter(|entry| entry.expires > Instant::now())
            .map(|entry| entry.alive)
    }

    pub(crate) fn put(&mut self, id: &str, alive: bool) {
        self.entries.insert(
            id.to_string(),
            CacheEntry {
                expires: Instant::now() + self.ttl,
                alive,
            },
        );
    }
}
