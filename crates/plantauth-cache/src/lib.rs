//! # plantauth-cache
//!
//! Two-tier caching for plantauth.
//!
//! ## Architecture
//!
//! - **L1 Cache (DashMap)**: In-memory, per-instance
//! - **L2 Cache (Redis)**: Network, shared across instances
//! - **Pub/Sub**: Cross-instance L1 invalidation
//!
//! ```text
//! CacheManager::get_or_create → L1 (DashMap) → L2 (Redis) → fetch (remote authority)
//! ```
//!
//! If Redis is unavailable or disabled, the backend falls back to L1-only
//! mode (local cache per instance).
//!
//! The [`CacheManager`] knows nothing about domain types: it stores any
//! `serde` value as JSON text under a string key with a [`CacheDuration`].

pub mod backend;
pub mod config;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod pubsub;
pub mod store;

pub use backend::{CacheBackend, CacheStats, CachedEntry};
pub use config::{RedisConfig, create_cache_backend};
pub use error::{CacheError, CacheResult};
pub use manager::{CacheDuration, CacheManager};
pub use pubsub::{CacheInvalidationListener, INVALIDATION_CHANNEL, publish_invalidation};
pub use store::CacheStore;

/// Re-exported so callers can pass cancellation tokens without a direct
/// `tokio-util` dependency.
pub use tokio_util::sync::CancellationToken;
