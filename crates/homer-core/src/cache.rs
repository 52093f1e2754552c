// In-memory time-to-live cache shared by the fetchers.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

struct CacheState<K, V> {
    /// Bumped by every `clear_all`. A computation records the epoch it
    /// started in and only publishes if the epoch is unchanged.
    epoch: u64,
    entries: HashMap<K, CacheEntry<V>>,
}

/// A keyed cache whose entries expire `ttl` after insertion.
///
/// Concurrent misses on the same key each run their computation and the last
/// one to finish wins. No lock is held while a computation is awaited.
/// `clear_all` drops every entry in one step; results of computations that
/// were already in flight when it ran are returned to their caller but not
/// stored.
pub struct TtlCache<K, V> {
    ttl: Duration,
    state: RwLock<CacheState<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(CacheState {
                epoch: 0,
                entries: HashMap::new(),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value for `key` if it has not expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let state = self.read();
        state
            .entries
            .get(key)
            .filter(|e| e.inserted_at.elapsed() < self.ttl)
            .map(|e| e.value.clone())
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let epoch = match self.lookup(&key) {
            Ok(hit) => return hit,
            Err(epoch) => epoch,
        };
        let value = compute().await;
        self.publish(key, value.clone(), epoch);
        value
    }

    /// Like `get_or_compute`, but for fallible computations. Errors are
    /// returned to the caller and never cached.
    pub async fn get_or_try_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let epoch = match self.lookup(&key) {
            Ok(hit) => return Ok(hit),
            Err(epoch) => epoch,
        };
        let value = compute().await?;
        self.publish(key, value.clone(), epoch);
        Ok(value)
    }

    /// Drop every entry.
    pub fn clear_all(&self) {
        let mut state = self.write();
        state.epoch += 1;
        let dropped = state.entries.len();
        state.entries.clear();
        debug!(dropped, epoch = state.epoch, "cache cleared");
    }

    /// Number of stored entries, including expired ones not yet replaced.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Ok(value)` on a fresh hit, otherwise `Err(current_epoch)`.
    fn lookup(&self, key: &K) -> Result<V, u64> {
        let state = self.read();
        match state.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Ok(entry.value.clone()),
            _ => Err(state.epoch),
        }
    }

    fn publish(&self, key: K, value: V, epoch: u64) {
        let mut state = self.write();
        if state.epoch != epoch {
            debug!("discarding result computed before cache clear");
            return;
        }
        state.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState<K, V>> {
        self.state.read().expect("cache lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState<K, V>> {
        self.state.write().expect("cache lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test(start_paused = true)]
    async fn second_lookup_within_ttl_is_a_hit() {
        let cache: TtlCache<String, u32> = TtlCache::new(TTL);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let v = cache
                .get_or_compute("judge".to_string(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    7
                })
                .await;
            assert_eq!(v, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new(TTL);
        cache.get_or_compute("k", || async { 1 }).await;
        assert_eq!(cache.get(&"k"), Some(1));

        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        assert_eq!(cache.get(&"k"), None);

        let v = cache.get_or_compute("k", || async { 2 }).await;
        assert_eq!(v, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_all_forces_recompute_within_ttl() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new(TTL);
        cache.get_or_compute("k", || async { 1 }).await;
        cache.clear_all();
        assert!(cache.is_empty());

        let v = cache.get_or_compute("k", || async { 2 }).await;
        assert_eq!(v, 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache: TtlCache<u8, u32> = TtlCache::new(TTL);
        let r: Result<u32, &str> = cache.get_or_try_compute(1, || async { Err("down") }).await;
        assert_eq!(r, Err("down"));
        assert!(cache.is_empty());

        let r: Result<u32, &str> = cache.get_or_try_compute(1, || async { Ok(9) }).await;
        assert_eq!(r, Ok(9));
        assert_eq!(cache.get(&1), Some(9));
    }

    #[tokio::test]
    async fn in_flight_result_is_dropped_after_clear() {
        let cache = Arc::new(TtlCache::<u8, u32>::new(TTL));
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let c = Arc::clone(&cache);
        let task = tokio::spawn(async move {
            c.get_or_compute(1, || async move {
                let _ = started_tx.send(());
                let _ = release_rx.await;
                100
            })
            .await
        });

        started_rx.await.unwrap();
        cache.clear_all();
        release_tx.send(()).unwrap();

        // The caller still sees its own result, but it is not stored.
        assert_eq!(task.await.unwrap(), 100);
        assert_eq!(cache.get(&1), None);
    }

    #[tokio::test]
    async fn concurrent_misses_last_writer_wins() {
        let cache = Arc::new(TtlCache::<u8, u32>::new(TTL));
        let a = cache.get_or_compute(1, || async {
            tokio::task::yield_now().await;
            1
        });
        let b = cache.get_or_compute(1, || async {
            tokio::task::yield_now().await;
            2
        });
        let (ra, rb) = tokio::join!(a, b);
        assert_eq!((ra, rb), (1, 2));
        assert!(matches!(cache.get(&1), Some(1) | Some(2)));
    }
}
