//! Shared mutable state (spec §5): TTL caches with single-flight fetch, and
//! tenant-qualified key builders. Cache keys are the single most dangerous
//! bug class in this system (spec §4.5) — every per-league/per-team cache
//! MUST route its key through [`keys`].

pub mod keys;

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;

/// A TTL cache with per-key single-flight: concurrent misses for the same
/// key collapse into one fetch (spec §5 "Writers use single-flight per key
/// to avoid thundering herds").
pub struct TtlCache<K, V> {
    entries: DashMap<K, (V, Instant)>,
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.entries.get(key)?;
        let (value, expires_at) = entry.value();
        if Instant::now() >= *expires_at {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(value.clone())
    }

    pub fn insert(&self, key: K, value: V, ttl: Duration) {
        self.entries.insert(key, (value, Instant::now() + ttl));
    }

    /// Fetch-or-compute with single-flight de-duplication. `fetch` runs at
    /// most once per key per miss, even under concurrent callers.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: K,
        ttl: Duration,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(v) = self.get(&key) {
            return Ok(v);
        }

        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        if let Some(v) = self.get(&key) {
            return Ok(v);
        }

        let value = fetch().await?;
        self.insert(key, value.clone(), ttl);
        Ok(value)
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn single_flight_collapses_concurrent_misses() {
        let cache: Arc<TtlCache<String, i32>> = Arc::new(TtlCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_try_insert_with("k".to_string(), Duration::from_secs(60), || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<i32, ()>(42)
                    })
                    .await
            }));
        }

        for h in handles {
            assert_eq!(h.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn expired_entry_is_treated_as_a_miss() {
        let cache: TtlCache<&str, i32> = TtlCache::new();
        cache.insert("k", 1, Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(&"k"), None);
    }

    #[test]
    fn fresh_entry_is_a_hit() {
        let cache: TtlCache<&str, i32> = TtlCache::new();
        cache.insert("k", 7, Duration::from_secs(60));
        assert_eq!(cache.get(&"k"), Some(7));
    }
}
