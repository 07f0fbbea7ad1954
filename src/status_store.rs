use std::{collections::HashMap, sync::Arc, time::Duration};

use bytes::Bytes;
use tokio::{sync::RwLock, time::Instant};

/// Default time-to-live for a device's status: three hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Last-known raw status of one device plus the moment it stops being valid.
#[derive(Debug, Clone)]
struct StatusEntry {
    payload: Bytes,
    expires_at: Instant,
}

impl StatusEntry {
    fn is_live_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory store of the most recent status payload per device.
///
/// Wrapped in `Arc` so it can be cheaply cloned and shared across tasks.
/// Uses `tokio::sync::RwLock` so concurrent readers never block each other.
/// Every entry lives for the same `ttl`; an entry past its deadline is never
/// returned, even while it still occupies the map waiting to be reclaimed.
#[derive(Clone)]
pub struct StatusStore {
    inner: Arc<RwLock<HashMap<String, StatusEntry>>>,
    ttl: Duration,
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl StatusStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or replace the status for `device_id` and restart its TTL.
    pub async fn put(&self, device_id: impl Into<String>, payload: Bytes) {
        let entry = StatusEntry {
            payload,
            expires_at: Instant::now() + self.ttl,
        };
        self.inner.write().await.insert(device_id.into(), entry);
    }

    /// Return the live payload for `device_id`, if present.
    ///
    /// An expired entry found here is removed on the way out.
    pub async fn get(&self, device_id: &str) -> Option<Bytes> {
        {
            let entries = self.inner.read().await;
            match entries.get(device_id) {
                None => return None,
                Some(entry) if entry.is_live_at(Instant::now()) => {
                    return Some(entry.payload.clone())
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a put may have refreshed it meanwhile.
        let mut entries = self.inner.write().await;
        if entries
            .get(device_id)
            .is_some_and(|entry| !entry.is_live_at(Instant::now()))
        {
            entries.remove(device_id);
        }
        None
    }

    /// Return a snapshot of every live payload, keyed by device. Iteration
    /// order of the returned map is unspecified.
    pub async fn get_all(&self) -> HashMap<String, Bytes> {
        let now = Instant::now();
        self.inner
            .read()
            .await
            .iter()
            .filter(|(_, entry)| entry.is_live_at(now))
            .map(|(id, entry)| (id.clone(), entry.payload.clone()))
            .collect()
    }

    /// Drop every expired entry and return how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.inner.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live_at(now));
        before - entries.len()
    }

    /// Number of entries physically held, including expired ones that have
    /// not been reclaimed yet.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use tokio::time;

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn empty_store_returns_nothing() {
        let store = StatusStore::new(TTL);
        assert!(store.get("dev1").await.is_none());
        assert!(store.get_all().await.is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn default_ttl_is_three_hours() {
        assert_eq!(StatusStore::default().ttl(), Duration::from_secs(10_800));
    }

    #[tokio::test]
    async fn put_and_get_single_payload() {
        let store = StatusStore::new(TTL);
        store.put("dev1", Bytes::from_static(b"{\"a\":1}")).await;

        assert_eq!(
            store.get("dev1").await.unwrap(),
            Bytes::from_static(b"{\"a\":1}")
        );
    }

    #[tokio::test]
    async fn put_replaces_previous_payload() {
        let store = StatusStore::new(TTL);
        store.put("dev1", Bytes::from_static(b"first")).await;
        store.put("dev1", Bytes::from_static(b"second")).await;

        assert_eq!(store.get("dev1").await.unwrap(), "second");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn different_devices_are_separate_entries() {
        let store = StatusStore::new(TTL);
        store.put("dev1", Bytes::from_static(b"one")).await;
        store.put("dev2", Bytes::from_static(b"two")).await;

        assert_eq!(store.get("dev1").await.unwrap(), "one");
        assert_eq!(store.get("dev2").await.unwrap(), "two");
        assert!(store.get("dev3").await.is_none());
    }

    #[tokio::test]
    async fn get_all_returns_every_live_entry() {
        let store = StatusStore::new(TTL);
        store.put("dev1", Bytes::from_static(b"one")).await;
        store.put("dev2", Bytes::from_static(b"two")).await;

        let all = store.get_all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all["dev1"], "one");
        assert_eq!(all["dev2"], "two");
    }

    #[tokio::test]
    async fn empty_device_id_is_an_ordinary_key() {
        let store = StatusStore::new(TTL);
        store.put("", Bytes::from_static(b"anon")).await;
        assert_eq!(store.get("").await.unwrap(), "anon");
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let store = StatusStore::new(TTL);
        store.put("dev1", Bytes::from_static(b"one")).await;

        time::advance(TTL - Duration::from_millis(1)).await;
        assert!(store.get("dev1").await.is_some());

        time::advance(Duration::from_millis(2)).await;
        assert!(store.get("dev1").await.is_none());
        assert!(store.get_all().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn get_reclaims_expired_entry() {
        let store = StatusStore::new(TTL);
        store.put("dev1", Bytes::from_static(b"one")).await;
        time::advance(TTL + Duration::from_secs(1)).await;

        assert_eq!(store.len().await, 1);
        assert!(store.get("dev1").await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn put_resets_ttl() {
        let store = StatusStore::new(TTL);
        store.put("dev1", Bytes::from_static(b"old")).await;
        time::advance(TTL / 2).await;
        store.put("dev1", Bytes::from_static(b"new")).await;
        time::advance(TTL / 2 + Duration::from_secs(1)).await;

        assert_eq!(store.get("dev1").await.unwrap(), "new");
    }

    #[tokio::test(start_paused = true)]
    async fn purge_removes_only_expired_entries() {
        let store = StatusStore::new(TTL);
        store.put("stale", Bytes::from_static(b"s")).await;
        time::advance(TTL / 2).await;
        store.put("fresh", Bytes::from_static(b"f")).await;
        time::advance(TTL / 2 + Duration::from_secs(1)).await;

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("fresh").await.unwrap(), "f");
        assert_eq!(store.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let store = StatusStore::new(TTL);
        let clone = store.clone();

        store.put("dev1", Bytes::from_static(b"one")).await;

        // Clone sees the same data
        assert_eq!(clone.get("dev1").await.unwrap(), "one");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_puts_leave_exactly_one_payload() {
        let store = StatusStore::new(TTL);
        let payloads: Vec<String> = (0..64).map(|i| format!("{{\"seq\":{i}}}")).collect();

        let handles: Vec<_> = payloads
            .iter()
            .cloned()
            .map(|p| {
                let store = store.clone();
                tokio::spawn(async move { store.put("dev1", Bytes::from(p)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let got = store.get("dev1").await.unwrap();
        let expected: HashSet<&[u8]> = payloads.iter().map(|p| p.as_bytes()).collect();
        assert!(expected.contains(got.as_ref()));
        assert_eq!(store.len().await, 1);
    }
}
