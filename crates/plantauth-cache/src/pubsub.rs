//! Redis Pub/Sub for cross-instance cache invalidation.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::backend::CachedEntry;
use crate::error::{CacheError, CacheResult};

/// Channel carrying the keys removed by any instance.
pub const INVALIDATION_CHANNEL: &str = "plantauth:cache:invalidate";

const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Cache invalidation listener that subscribes to Redis Pub/Sub.
///
/// ```text
/// Instance 1: invalidate_all(plant, user) → DEL + PUBLISH each key
///   ↓
/// Instance 2: listener receives key → removes its L1 copy
/// ```
pub struct CacheInvalidationListener {
    pub redis_url: String,
    pub local_cache: Arc<DashMap<String, CachedEntry>>,
}

impl CacheInvalidationListener {
    /// Start listening for cache invalidation events.
    ///
    /// Spawns a background task that reconnects with exponential backoff
    /// (capped at five minutes) whenever the subscription drops.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut backoff = Duration::from_secs(1);

            loop {
                match self.run().await {
                    Ok(()) => {
                        backoff = Duration::from_secs(1);
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            backoff_secs = backoff.as_secs(),
                            "Cache invalidation listener error, reconnecting..."
                        );
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }
        })
    }

    async fn run(&self) -> Result<(), String> {
        use futures_util::StreamExt;

        let client = redis::Client::open(self.redis_url.clone())
            .map_err(|e| format!("failed to create Redis client: {e}"))?;

        let mut pubsub = client
            .get_async_pubsub()
            .await
            .map_err(|e| format!("failed to get pub/sub connection: {e}"))?;

        pubsub
            .subscribe(INVALIDATION_CHANNEL)
            .await
            .map_err(|e| format!("failed to subscribe: {e}"))?;

        tracing::info!(channel = INVALIDATION_CHANNEL, "Subscribed to cache invalidation channel");

        let mut stream = pubsub.on_message();
        loop {
            match stream.next().await {
                Some(msg) => match msg.get_payload::<String>() {
                    Ok(key) => {
                        tracing::debug!(key = %key, "received cache invalidation");
                        self.local_cache.remove(&key);
                    }
                    Err(_) => {
                        tracing::warn!("failed to parse invalidation message payload");
                    }
                },
                None => {
                    return Err("pub/sub connection closed".to_string());
                }
            }
        }
    }
}

/// Publish a cache invalidation event to other instances.
///
/// Called by `CacheBackend::invalidate()`; exposed for keys removed by
/// other means (e.g. a bulk `DEL` from an admin script).
pub async fn publish_invalidation(redis: &Pool, key: &str) -> CacheResult<()> {
    let mut conn = redis
        .get()
        .await
        .map_err(|e| CacheError::backend(format!("failed to get Redis connection: {e}")))?;

    conn.publish::<_, _, ()>(INVALIDATION_CHANNEL, key)
        .await
        .map_err(|e| CacheError::backend(format!("failed to publish invalidation: {e}")))?;

    tracing::debug!(key = %key, "published cache invalidation");
    Ok(())
}
