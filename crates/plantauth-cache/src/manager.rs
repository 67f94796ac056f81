//! Cache-aside manager over a [`CacheStore`].
//!
//! Values are stored as JSON text. The manager guarantees that a read
//! returns what was last written under a key; it does not coordinate
//! concurrent misses. Two requests missing the same key both run their
//! fetch and both write, and the last write wins.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{CacheError, CacheResult};
use crate::store::CacheStore;

/// JSON text of the zero value. Never written, and read back as a miss.
const NULL_VALUE: &str = "null";

/// A TTL class: a unit paired with a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheDuration {
    Seconds(u64),
    Minutes(u64),
    Hours(u64),
}

impl CacheDuration {
    /// The expiry this class expresses.
    #[must_use]
    pub fn as_duration(self) -> Duration {
        match self {
            Self::Seconds(n) => Duration::from_secs(n),
            Self::Minutes(n) => Duration::from_secs(n.saturating_mul(60)),
            Self::Hours(n) => Duration::from_secs(n.saturating_mul(3600)),
        }
    }
}

/// Generic cache-aside primitive.
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Read-only lookup. A miss does not populate the cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Corrupted`] if an entry exists but is not a `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> CacheResult<Option<T>> {
        let text = with_cancel(cancel, self.store.get_string(key)).await?;
        decode(key, text)
    }

    /// Return the cached value for `key`, or run `fetch`, cache its result
    /// for `duration` and return it.
    ///
    /// `fetch` is not invoked on a hit. The write happens only after `fetch`
    /// completed successfully, so a cancelled or failed fetch leaves the key
    /// untouched. Errors from `fetch` are returned unchanged.
    pub async fn get_or_create<T, E, F, Fut>(
        &self,
        key: &str,
        fetch: F,
        duration: CacheDuration,
        cancel: &CancellationToken,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let started = Instant::now();

        if let Some(item) = self.get::<T>(key, cancel).await? {
            tracing::debug!(
                key = %key,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "fetched from cache"
            );
            return Ok(item);
        }

        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CacheError::Cancelled.into()),
            item = fetch(cancel.clone()) => item?,
        };

        self.create(key, &item, duration, cancel).await?;

        tracing::debug!(
            key = %key,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "added to cache"
        );
        Ok(item)
    }

    /// Write `value` under `key` for `duration`.
    ///
    /// A value serializing to the zero value is not written.
    pub async fn create<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        duration: CacheDuration,
        cancel: &CancellationToken,
    ) -> CacheResult<()> {
        let text = serde_json::to_string(value).map_err(|source| CacheError::Serialization {
            key: key.to_string(),
            source,
        })?;

        if text == NULL_VALUE {
            tracing::debug!(key = %key, "not caching empty value");
            return Ok(());
        }

        with_cancel(
            cancel,
            self.store.set_string(key, &text, duration.as_duration()),
        )
        .await
    }

    /// Read several keys, skipping the ones that are absent.
    pub async fn get_many<T: DeserializeOwned>(
        &self,
        keys: &[String],
        cancel: &CancellationToken,
    ) -> CacheResult<Vec<T>> {
        let mut items = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(item) = self.get(key, cancel).await? {
                items.push(item);
            }
        }
        Ok(items)
    }

    /// Remove `key`. Removing an absent key is a no-op.
    pub async fn remove(&self, key: &str, cancel: &CancellationToken) -> CacheResult<()> {
        with_cancel(cancel, self.store.remove(key)).await?;
        tracing::debug!(key = %key, "removed from cache");
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(key: &str, text: Option<String>) -> CacheResult<Option<T>> {
    let Some(text) = text else {
        return Ok(None);
    };
    if text.trim() == NULL_VALUE {
        return Ok(None);
    }

    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| CacheError::Corrupted {
            key: key.to_string(),
            type_name: std::any::type_name::<T>(),
            source,
        })
}

async fn with_cancel<T>(
    cancel: &CancellationToken,
    operation: impl Future<Output = CacheResult<T>>,
) -> CacheResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CacheError::Cancelled),
        result = operation => result,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::backend::CacheBackend;

    fn manager() -> (CacheManager, CacheBackend) {
        let backend = CacheBackend::new_local();
        (CacheManager::new(Arc::new(backend.clone())), backend)
    }

    #[test]
    fn test_cache_duration() {
        assert_eq!(
            CacheDuration::Seconds(30).as_duration(),
            Duration::from_secs(30)
        );
        assert_eq!(
            CacheDuration::Minutes(20).as_duration(),
            Duration::from_secs(1200)
        );
        assert_eq!(
            CacheDuration::Hours(24).as_duration(),
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn test_cache_duration_saturates() {
        assert_eq!(
            CacheDuration::Minutes(u64::MAX).as_duration(),
            Duration::from_secs(u64::MAX)
        );
        assert_eq!(
            CacheDuration::Hours(u64::MAX / 60).as_duration(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[tokio::test]
    async fn test_get_or_create_fetches_once() {
        let (manager, _) = manager();
        let cancel = CancellationToken::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<String> = manager
                .get_or_create(
                    "PERMISSIONS_X_P1",
                    |_| async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, CacheError>(vec!["TAG/READ".to_string()])
                    },
                    CacheDuration::Minutes(5),
                    &cancel,
                )
                .await
                .unwrap();
            assert_eq!(value, vec!["TAG/READ".to_string()]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_list_is_cached() {
        let (manager, backend) = manager();
        let cancel = CancellationToken::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Vec<String> = manager
                .get_or_create(
                    "RESTRICTIONS_X_P1",
                    |_| async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, CacheError>(Vec::new())
                    },
                    CacheDuration::Minutes(5),
                    &cancel,
                )
                .await
                .unwrap();
            assert!(value.is_empty());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.get("RESTRICTIONS_X_P1").await.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_zero_value_is_refetched() {
        let (manager, backend) = manager();
        let cancel = CancellationToken::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Option<String> = manager
                .get_or_create(
                    "PERSONS_X",
                    |_| async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, CacheError>(None)
                    },
                    CacheDuration::Minutes(5),
                    &cancel,
                )
                .await
                .unwrap();
            assert!(value.is_none());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(backend.get("PERSONS_X").await.is_none());
    }

    #[tokio::test]
    async fn test_stored_null_reads_as_miss() {
        let (manager, backend) = manager();
        backend.set("k", "null", Duration::from_secs(60)).await;

        let value: Option<Vec<String>> = manager.get("k", &CancellationToken::new()).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_corrupted_entry_is_an_error() {
        let (manager, backend) = manager();
        let cancel = CancellationToken::new();
        backend
            .set("PLANTS_X", "{\"not\":\"a list\"}", Duration::from_secs(60))
            .await;

        let result: Result<Vec<String>, CacheError> = manager
            .get_or_create(
                "PLANTS_X",
                |_| async { Err(CacheError::backend("fetch must not run on a corrupted entry")) },
                CacheDuration::Minutes(5),
                &cancel,
            )
            .await;

        match result {
            Err(CacheError::Corrupted { key, type_name, .. }) => {
                assert_eq!(key, "PLANTS_X");
                assert!(type_name.contains("Vec"));
            }
            other => panic!("expected corruption error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_error_is_propagated_and_not_cached() {
        #[derive(Debug)]
        enum FetchError {
            Remote,
            Cache,
        }
        impl From<CacheError> for FetchError {
            fn from(_: CacheError) -> Self {
                FetchError::Cache
            }
        }

        let (manager, backend) = manager();
        let result: Result<Vec<String>, FetchError> = manager
            .get_or_create(
                "PROJECTS_X_P1",
                |_| async { Err::<Vec<String>, _>(FetchError::Remote) },
                CacheDuration::Minutes(5),
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(FetchError::Remote)));
        assert!(backend.get("PROJECTS_X_P1").await.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_lookup() {
        let (manager, _) = manager();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<Vec<String>, CacheError> = manager
            .get_or_create(
                "k",
                |_| async { Ok::<_, CacheError>(vec!["x".to_string()]) },
                CacheDuration::Seconds(10),
                &cancel,
            )
            .await;

        assert!(matches!(result, Err(CacheError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_during_fetch_writes_nothing() {
        let (manager, backend) = manager();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let result: Result<Vec<String>, CacheError> = manager
            .get_or_create(
                "k",
                move |_| async move {
                    trigger.cancel();
                    std::future::pending::<Result<Vec<String>, CacheError>>().await
                },
                CacheDuration::Seconds(10),
                &cancel,
            )
            .await;

        assert!(matches!(result, Err(CacheError::Cancelled)));
        assert!(backend.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_get_does_not_populate() {
        let (manager, backend) = manager();
        let value: Option<Vec<String>> = manager
            .get("missing", &CancellationToken::new())
            .await
            .unwrap();
        assert!(value.is_none());
        assert_eq!(backend.stats().l1_entries, 0);
    }

    #[tokio::test]
    async fn test_get_many_skips_absent() {
        let (manager, _) = manager();
        let cancel = CancellationToken::new();
        manager
            .create("a", &1u32, CacheDuration::Seconds(60), &cancel)
            .await
            .unwrap();
        manager
            .create("c", &3u32, CacheDuration::Seconds(60), &cancel)
            .await
            .unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let values: Vec<u32> = manager.get_many(&keys, &cancel).await.unwrap();
        assert_eq!(values, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (manager, _) = manager();
        let cancel = CancellationToken::new();
        manager
            .create("a", &"x", CacheDuration::Seconds(60), &cancel)
            .await
            .unwrap();

        manager.remove("a", &cancel).await.unwrap();
        manager.remove("a", &cancel).await.unwrap();

        let value: Option<String> = manager.get("a", &cancel).await.unwrap();
        assert!(value.is_none());
    }
}
