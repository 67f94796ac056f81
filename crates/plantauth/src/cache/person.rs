//! Person cache.

use std::sync::Arc;

use plantauth_cache::{CacheDuration, CacheManager};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::keys;
use crate::api::PersonApi;
use crate::config::CacheOptions;
use crate::error::AuthzResult;
use crate::types::Person;

/// Cache-aside over the remote person authority, using the Person TTL class.
///
/// An unknown person is not cached: the next lookup asks the authority
/// again.
pub struct PersonCache {
    cache: CacheManager,
    api: Arc<dyn PersonApi>,
    duration: CacheDuration,
}

impl PersonCache {
    pub fn new(cache: CacheManager, api: Arc<dyn PersonApi>, options: &CacheOptions) -> Self {
        Self {
            cache,
            api,
            duration: options.person_duration(),
        }
    }

    pub async fn get(
        &self,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Option<Person>> {
        let key = keys::persons(user_oid)?;
        let api = &self.api;

        self.cache
            .get_or_create(
                &key,
                move |token| async move { api.try_get_person_by_oid(user_oid, &token).await },
                self.duration,
                cancel,
            )
            .await
    }

    pub async fn exists(&self, user_oid: Uuid, cancel: &CancellationToken) -> AuthzResult<bool> {
        Ok(self.get(user_oid, cancel).await?.is_some())
    }

    /// All persons in a plant, cached under the plant rather than a user.
    pub async fn get_all_for_tenant(
        &self,
        plant_id: &str,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<Person>> {
        let key = keys::person_list(plant_id)?;
        let api = &self.api;

        self.cache
            .get_or_create(
                &key,
                move |token| async move { api.get_all_persons(plant_id, &token).await },
                self.duration,
                cancel,
            )
            .await
    }

    /// Drop the cached person so the next lookup reaches the authority.
    pub async fn invalidate(&self, user_oid: Uuid, cancel: &CancellationToken) -> AuthzResult<()> {
        let key = keys::persons(user_oid)?;
        self.cache.remove(&key, cancel).await?;
        tracing::debug!(user_oid = %user_oid, "person cache invalidated");
        Ok(())
    }
}
