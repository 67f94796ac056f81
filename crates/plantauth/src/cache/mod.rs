//! Person and permission caches.
//!
//! Both are cache-aside layers over a remote authority, built on
//! [`plantauth_cache::CacheManager`]:
//!
//! ```text
//! PermissionCache::get_permissions(plant, user)
//!   → CacheManager::get_or_create("PERMISSIONS_<OID>_<PLANT>")
//!     → hit: cached list
//!     → miss: PermissionApi::get_permissions_for_user → cache for the Permission TTL
//! ```
//!
//! Concurrent misses on one key are not coordinated; both requests fetch
//! and the last write wins.

pub mod keys;
pub mod permission;
pub mod person;

#[cfg(test)]
pub(crate) mod fakes;

pub use permission::{PermissionCache, ProjectRef};
pub use person::PersonCache;
