use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;

/// A cached value paired with the instant it stops being trustworthy.
/// Built on a write-invalidated `ArcSwap` snapshot with a TTL added: a
/// write still replaces the snapshot unconditionally, but a read
/// additionally checks `expires_at` and repopulates from the backing
/// store when stale, so data also refreshes on a schedule rather than
/// only on an explicit write.
struct CacheSnapshot<T> {
    value: Option<T>,
    expires_at: Instant,
}

impl<T> CacheSnapshot<T> {
    fn empty() -> Self {
        Self {
            value: None,
            expires_at: Instant::now(),
        }
    }

    fn is_fresh(&self) -> bool {
        self.value.is_some() && Instant::now() < self.expires_at
    }
}

/// A single TTL'd slot behind an `ArcSwap`. Readers never block a concurrent
/// write; a write always clears the slot so the next read repopulates.
pub struct TtlCache<T> {
    slot: ArcSwap<CacheSnapshot<T>>,
    ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: ArcSwap::from_pointee(CacheSnapshot::empty()),
            ttl,
        }
    }

    /// Returns the cached value if still fresh, otherwise `None` — the
    /// caller is expected to repopulate via [`TtlCache::store`].
    pub fn get(&self) -> Option<T> {
        let snapshot = self.slot.load();
        if snapshot.is_fresh() {
            snapshot.value.clone()
        } else {
            None
        }
    }

    pub fn store(&self, value: T) {
        self.slot.store(Arc::new(CacheSnapshot {
            value: Some(value),
            expires_at: Instant::now() + self.ttl,
        }));
    }

    /// Write-invalidation: clears the slot unconditionally so the next
    /// reader repopulates from the backing store regardless of TTL.
    pub fn invalidate(&self) {
        self.slot.store(Arc::new(CacheSnapshot::empty()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cache_misses() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn stored_value_is_fresh_until_ttl_elapses() {
        let cache = TtlCache::new(Duration::from_millis(5));
        cache.store(42u32);
        assert_eq!(cache.get(), Some(42));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn invalidate_clears_before_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.store(7u32);
        cache.invalidate();
        assert_eq!(cache.get(), None);
    }
}
