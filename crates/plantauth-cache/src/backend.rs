//! Cache backend implementation with L1 (DashMap) and L2 (Redis) tiers.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::error::{CacheError, CacheResult};
use crate::metrics::{record_cache_hit, record_cache_miss};
use crate::pubsub::publish_invalidation;
use crate::store::CacheStore;

/// A cached text value with TTL support.
///
/// The text is wrapped in `Arc` so that promoting an L2 hit into L1 and
/// handing it to the caller share one allocation.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<str>,
    pub cached_at: Instant,
    pub ttl: Duration,
}

impl CachedEntry {
    /// Create a new cached entry.
    pub fn new(data: impl Into<Arc<str>>, ttl: Duration) -> Self {
        Self {
            data: data.into(),
            cached_at: Instant::now(),
            ttl,
        }
    }

    /// Check if this entry has expired.
    pub fn is_expired(&self) -> bool {
        self.cached_at.elapsed() > self.ttl
    }
}

/// Two-tier cache backend: L1 (DashMap) + L2 (Redis).
///
/// ## Cache Modes
///
/// - **Local**: Single-instance mode using only DashMap
/// - **Redis**: Multi-instance mode with DashMap (L1) + Redis (L2)
///
/// In Redis mode L1 copies live for at most `l1_ttl`, so an entry rewritten
/// by another instance is picked up within that window even if its
/// invalidation message was missed.
#[derive(Clone)]
pub enum CacheBackend {
    /// Single-instance: local DashMap only
    Local(Arc<DashMap<String, CachedEntry>>),

    /// Multi-instance: Redis + local L1
    Redis {
        redis: Pool,
        local: Arc<DashMap<String, CachedEntry>>,
        l1_ttl: Duration,
    },
}

impl CacheBackend {
    /// Create a new local-only cache backend.
    pub fn new_local() -> Self {
        CacheBackend::Local(Arc::new(DashMap::new()))
    }

    /// Create a new Redis-backed cache backend.
    pub fn new_redis(redis_pool: Pool, l1_ttl: Duration) -> Self {
        CacheBackend::Redis {
            redis: redis_pool,
            local: Arc::new(DashMap::new()),
            l1_ttl,
        }
    }

    /// Get a value from the cache.
    ///
    /// ## Lookup Order
    ///
    /// 1. Check L1 (DashMap)
    /// 2. Check L2 (Redis)
    /// 3. Return None if not found
    ///
    /// If found in L2, the value is promoted to L1 for at most `l1_ttl` and
    /// never beyond its remaining TTL in Redis. An unreachable Redis is
    /// reported as a miss so requests keep working on L1 alone.
    pub async fn get(&self, key: &str) -> Option<Arc<str>> {
        match self {
            CacheBackend::Local(map) => {
                let result = lookup_local(map, key);
                if result.is_some() {
                    record_cache_hit("L1");
                } else {
                    record_cache_miss();
                }
                result
            }
            CacheBackend::Redis {
                redis,
                local,
                l1_ttl,
            } => {
                if let Some(data) = lookup_local(local, key) {
                    tracing::debug!(key = %key, "cache hit (L1)");
                    record_cache_hit("L1");
                    return Some(data);
                }

                let mut conn = match redis.get().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to get Redis connection");
                        record_cache_miss();
                        return None;
                    }
                };

                let reply: redis::RedisResult<(Option<String>, i64)> =
                    redis::pipe().get(key).pttl(key).query_async(&mut conn).await;
                match reply {
                    Ok((Some(data), remaining_ms)) => {
                        tracing::debug!(key = %key, "cache hit (L2)");
                        record_cache_hit("L2");

                        let entry = CachedEntry::new(data, promoted_ttl(remaining_ms, *l1_ttl));
                        let data = Arc::clone(&entry.data);
                        local.insert(key.to_string(), entry);
                        Some(data)
                    }
                    Ok((None, _)) => {
                        tracing::debug!(key = %key, "cache miss");
                        record_cache_miss();
                        None
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Redis GET error");
                        record_cache_miss();
                        None
                    }
                }
            }
        }
    }

    /// Set a value in the cache with TTL.
    ///
    /// ## Write Strategy
    ///
    /// - **Local mode**: Write to DashMap only
    /// - **Redis mode**: Write to L1, then to L2 and wait for the reply
    ///
    /// A failed L2 write is logged and leaves the L1 copy in place.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        match self {
            CacheBackend::Local(map) => {
                map.insert(key.to_string(), CachedEntry::new(value, ttl));
            }
            CacheBackend::Redis {
                redis,
                local,
                l1_ttl,
            } => {
                local.insert(key.to_string(), CachedEntry::new(value, ttl.min(*l1_ttl)));

                let ttl_ms = ttl.as_millis().max(1) as u64;
                match redis.get().await {
                    Ok(mut conn) => {
                        if let Err(e) = conn.pset_ex::<_, _, ()>(key, value, ttl_ms).await {
                            tracing::warn!(key = %key, error = %e, "Redis SET error");
                        } else {
                            tracing::debug!(key = %key, ttl_ms = %ttl_ms, "cache set (L1+L2)");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Failed to get Redis connection");
                    }
                }
            }
        }
    }

    /// Invalidate a cache entry.
    ///
    /// ## Invalidation Strategy
    ///
    /// - **Local mode**: Remove from DashMap
    /// - **Redis mode**: Remove from L1 and L2, then publish invalidation event
    ///
    /// Unlike reads and writes, a failed L2 delete is an error: the stale
    /// value would otherwise outlive the invalidation.
    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(map) => {
                map.remove(key);
                tracing::debug!(key = %key, "cache invalidated (local)");
                Ok(())
            }
            CacheBackend::Redis { redis, local, .. } => {
                local.remove(key);

                let mut conn = redis.get().await.map_err(|e| {
                    CacheError::backend(format!("failed to get Redis connection: {e}"))
                })?;

                conn.del::<_, ()>(key)
                    .await
                    .map_err(|e| CacheError::backend(format!("Redis DEL {key} failed: {e}")))?;
                drop(conn);

                // Other instances keep their L1 copy until l1_ttl if this fails.
                if let Err(e) = publish_invalidation(redis, key).await {
                    tracing::warn!(key = %key, error = %e, "cache invalidation not published");
                } else {
                    tracing::debug!(key = %key, "cache invalidated (L1+L2+pub/sub)");
                }
                Ok(())
            }
        }
    }

    /// Remove expired L1 entries. Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        sweep(self.local_cache())
    }

    /// Sweep expired L1 entries every `interval`.
    ///
    /// Reads only evict the key they touch, so entries for users who never
    /// come back are dropped here. The task holds a weak reference and ends
    /// once the backend and all its clones are dropped.
    pub fn start_cleanup(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let map = Arc::downgrade(self.local_cache());

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(map) = Weak::upgrade(&map) else {
                    tracing::debug!("cache backend dropped, stopping L1 cleanup");
                    return;
                };
                let removed = sweep(&map);
                if removed > 0 {
                    tracing::debug!(removed, remaining = map.len(), "swept expired L1 entries");
                }
            }
        })
    }

    /// Get cache statistics (L1 only).
    pub fn stats(&self) -> CacheStats {
        match self {
            CacheBackend::Local(map) => CacheStats {
                l1_entries: map.len(),
                mode: "local".to_string(),
            },
            CacheBackend::Redis { local, .. } => CacheStats {
                l1_entries: local.len(),
                mode: "redis".to_string(),
            },
        }
    }

    /// Check if Redis is available (for health checks).
    pub async fn is_redis_available(&self) -> bool {
        match self {
            CacheBackend::Local(_) => false,
            CacheBackend::Redis { redis, .. } => redis.get().await.is_ok(),
        }
    }

    /// Get the local cache reference.
    pub fn local_cache(&self) -> &Arc<DashMap<String, CachedEntry>> {
        match self {
            CacheBackend::Local(map) => map,
            CacheBackend::Redis { local, .. } => local,
        }
    }
}

fn sweep(map: &DashMap<String, CachedEntry>) -> usize {
    let before = map.len();
    map.retain(|_, entry| !entry.is_expired());
    before.saturating_sub(map.len())
}

/// L1 lifetime of a value promoted from L2: `l1_ttl`, capped by the time
/// the entry has left in Redis (`PTTL`; negative when it has no expiry).
fn promoted_ttl(remaining_ms: i64, l1_ttl: Duration) -> Duration {
    match u64::try_from(remaining_ms) {
        Ok(ms) => l1_ttl.min(Duration::from_millis(ms)),
        Err(_) => l1_ttl,
    }
}

fn lookup_local(map: &DashMap<String, CachedEntry>, key: &str) -> Option<Arc<str>> {
    if let Some(entry) = map.get(key) {
        if !entry.is_expired() {
            return Some(Arc::clone(&entry.data));
        }
        drop(entry);
        map.remove(key);
    }
    None
}

#[async_trait]
impl CacheStore for CacheBackend {
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.get(key).await.map(|data| data.to_string()))
    }

    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.set(key, value, ttl).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.invalidate(key).await
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub l1_entries: usize,
    pub mode: String,
}
