//! Key/value store with per-entry absolute or sliding expiration
//!
//! Expired entries are removed lazily. Every `set`/`remove` drains the front of
//! a min-heap of `(expiration snapshot, key)` markers; a marker only evicts its
//! entry if the entry's current expiration still equals the snapshot, so markers
//! left behind by renewals or overwrites are discarded harmlessly. Renewals only
//! ever move an expiration later, which keeps the heap front a safe lower bound.
//!
//! Not safe for concurrent use; callers wrap it in a lock.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use tokio::time::Instant;

struct Entry<T> {
    value: T,
    expires_at: Instant,
    /// Zero for fixed expiration
    sliding: Duration,
}

pub struct ExpiringCache<T> {
    entries: HashMap<String, Entry<T>>,
    expirations: BinaryHeap<Reverse<(Instant, String)>>,
}

impl<T> Default for ExpiringCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ExpiringCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            expirations: BinaryHeap::new(),
        }
    }

    /// Insert or overwrite `key`, expiring `ttl` from now.
    ///
    /// With `renew_on_access`, every live `get`/`has` pushes the expiration to
    /// `ttl` after the access.
    pub fn set(&mut self, key: impl Into<String>, value: T, ttl: Duration, renew_on_access: bool) {
        let key = key.into();
        let now = Instant::now();
        let expires_at = now + ttl;
        let sliding = if renew_on_access { ttl } else { Duration::ZERO };

        self.entries.insert(
            key.clone(),
            Entry {
                value,
                expires_at,
                sliding,
            },
        );
        self.expirations.push(Reverse((expires_at, key)));
        self.purge(now);
    }

    /// Live value for `key`, renewing sliding entries
    pub fn get(&mut self, key: &str) -> Option<&T> {
        let now = Instant::now();
        let entry = self.entries.get_mut(key)?;
        if now >= entry.expires_at {
            return None;
        }

        if !entry.sliding.is_zero() {
            let renewed = now + entry.sliding;
            if renewed > entry.expires_at {
                entry.expires_at = renewed;
                self.expirations.push(Reverse((renewed, key.to_string())));
            }
        }

        Some(&entry.value)
    }

    /// Same liveness and renewal rules as [`get`](Self::get)
    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Delete `key` regardless of expiration
    pub fn remove(&mut self, key: &str) -> Option<T> {
        let removed = self.entries.remove(key).map(|entry| entry.value);
        self.purge(Instant::now());
        removed
    }

    /// Size of the backing store.
    ///
    /// May include expired entries that have not been purged yet.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge(&mut self, now: Instant) {
        while let Some(Reverse((at, _))) = self.expirations.peek() {
            if *at > now {
                break;
            }
            let Some(Reverse((at, key))) = self.expirations.pop() else {
                break;
            };
            if self
                .entries
                .get(&key)
                .is_some_and(|entry| entry.expires_at == at)
            {
                self.entries.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::time::advance;

    const fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_get_roundtrip() {
        let mut cache = ExpiringCache::new();
        cache.set("k", "v", ms(500), false);
        assert_eq!(cache.get("k"), Some(&"v"));

        advance(ms(501)).await;
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_nonexistent() {
        let mut cache: ExpiringCache<u32> = ExpiringCache::new();
        assert_eq!(cache.get("missing"), None);
        assert!(!cache.has("missing"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sliding_expiration_renews_on_access() {
        let mut cache = ExpiringCache::new();
        cache.set("k", 1, ms(1000), true);

        // t = 0, 600, 1200, 1800
        assert!(cache.get("k").is_some());
        for _ in 0..3 {
            advance(ms(600)).await;
            assert!(cache.get("k").is_some());
        }

        // t = 3100, last renewal expired at 2800
        advance(ms(1300)).await;
        assert!(cache.get("k").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_expiration_is_not_renewed() {
        let mut cache = ExpiringCache::new();
        cache.set("k", 1, ms(1000), false);

        advance(ms(600)).await;
        assert!(cache.has("k"));
        advance(ms(600)).await;
        assert!(!cache.has("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_has_renews_sliding_entry() {
        let mut cache = ExpiringCache::new();
        cache.set("k", 1, ms(1000), true);

        advance(ms(900)).await;
        assert!(cache.has("k"));
        advance(ms(900)).await;
        assert!(cache.has("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_len_overcounts_until_purge() {
        let mut cache = ExpiringCache::new();
        cache.set("a", 1, ms(100), false);

        advance(ms(200)).await;
        assert!(cache.get("a").is_none());
        assert_eq!(cache.len(), 1);

        cache.set("b", 2, ms(1000), false);
        assert_eq!(cache.len(), 1);
        assert!(cache.has("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_keeps_renewed_entry() {
        let mut cache = ExpiringCache::new();
        cache.set("a", 1, ms(1000), true);

        advance(ms(600)).await;
        assert!(cache.get("a").is_some());

        // Original marker (t=1000) is due, entry now expires at 1600
        advance(ms(500)).await;
        cache.set("b", 2, ms(1000), false);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_discards_stale_marker() {
        let mut cache = ExpiringCache::new();
        cache.set("a", 1, ms(100), false);
        cache.set("a", 2, ms(10_000), false);

        advance(ms(200)).await;
        cache.set("b", 3, ms(1000), false);
        assert_eq!(cache.get("a"), Some(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove() {
        let mut cache = ExpiringCache::new();
        cache.set("a", 1, ms(10_000), false);
        cache.set("b", 2, ms(10), false);

        advance(ms(20)).await;
        assert_eq!(cache.remove("a"), Some(1));
        assert!(!cache.has("a"));
        // removal also purged the expired "b"
        assert!(cache.is_empty());
        assert_eq!(cache.remove("a"), None);
    }
}
