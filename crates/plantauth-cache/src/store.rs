//! The string key/value store the cache manager writes through.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheResult;

/// A generic get/set/remove store keyed by string, holding opaque text.
///
/// Implementations know nothing about the values they hold. Expiry is
/// enforced by the store: an entry past its TTL must read as absent.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the text stored under `key`, or `None` if absent or expired.
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` under `key` for `ttl`, replacing any previous value.
    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> CacheResult<()>;
}
