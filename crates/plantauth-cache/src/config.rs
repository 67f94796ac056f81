//! Redis configuration and backend construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::CacheBackend;
use crate::pubsub::CacheInvalidationListener;

/// Redis configuration for the L2 cache tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Enable Redis (gracefully degrades without it)
    /// Default: false (disabled for single-instance deployments)
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,

    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,

    /// Upper bound on how long an entry stays in the per-instance L1 tier
    #[serde(default = "default_l1_ttl", with = "humantime_serde")]
    pub l1_ttl: Duration,

    /// How often expired L1 entries are swept, in both modes
    #[serde(default = "default_cleanup_interval", with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

fn default_redis_enabled() -> bool {
    false
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

fn default_l1_ttl() -> Duration {
    Duration::from_secs(30)
}

fn default_cleanup_interval() -> Duration {
    Duration::from_secs(60)
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: default_redis_enabled(),
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
            l1_ttl: default_l1_ttl(),
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

/// Create the cache backend described by `config`.
///
/// Any failure to reach Redis falls back to local-only mode with a warning.
/// In Redis mode the cross-instance invalidation listener is started. In
/// both modes expired L1 entries are swept every `cleanup_interval`.
pub async fn create_cache_backend(config: &RedisConfig) -> CacheBackend {
    let backend = connect(config).await;
    backend.start_cleanup(config.cleanup_interval);
    backend
}

async fn connect(config: &RedisConfig) -> CacheBackend {
    if !config.enabled {
        tracing::info!("Redis disabled, using local cache only");
        return CacheBackend::new_local();
    }

    tracing::info!(url = %config.url, "Connecting to Redis");

    let mut redis_config = deadpool_redis::Config::from_url(&config.url);
    let timeout = Duration::from_millis(config.timeout_ms);
    let mut pool_config = deadpool_redis::PoolConfig::new(config.pool_size);
    pool_config.timeouts.wait = Some(timeout);
    pool_config.timeouts.create = Some(timeout);
    pool_config.timeouts.recycle = Some(timeout);
    redis_config.pool = Some(pool_config);

    let pool = match redis_config.create_pool(Some(deadpool_redis::Runtime::Tokio1)) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to create Redis pool. Falling back to local cache."
            );
            return CacheBackend::new_local();
        }
    };

    match pool.get().await {
        Ok(_) => {
            tracing::info!("Connected to Redis");

            let backend = CacheBackend::new_redis(pool, config.l1_ttl);
            CacheInvalidationListener {
                redis_url: config.url.clone(),
                local_cache: backend.local_cache().clone(),
            }
            .start();

            backend
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to connect to Redis. Falling back to local cache."
            );
            CacheBackend::new_local()
        }
    }
}
