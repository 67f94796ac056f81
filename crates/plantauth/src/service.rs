//! Wiring of caches, remote authorities and the augmenter.

use std::sync::Arc;

use plantauth_cache::{CacheManager, CacheStore, create_cache_backend};

use crate::api::{
    BearerTokenProvider, MainApiClient, MainApiPermissionService, MainApiPersonService,
    PermissionApi, PersonApi,
};
use crate::cache::{PermissionCache, PersonCache};
use crate::claims::{ClaimsAugmenter, LocalPersonRepository};
use crate::config::AuthzConfig;
use crate::error::AuthzResult;

/// The public surface of the library, built from one configuration.
pub struct PlantAuth {
    pub person_cache: Arc<PersonCache>,
    pub permission_cache: Arc<PermissionCache>,
    pub augmenter: ClaimsAugmenter,
}

impl PlantAuth {
    /// Build against the main API, with the cache backend `config.redis`
    /// describes.
    pub async fn from_config(
        config: &AuthzConfig,
        tokens: Arc<dyn BearerTokenProvider>,
        local_persons: Arc<dyn LocalPersonRepository>,
    ) -> AuthzResult<Self> {
        let client = Arc::new(MainApiClient::new(&config.main_api, tokens)?);
        let permission_api = Arc::new(MainApiPermissionService::new(
            client.clone(),
            config.main_api.client_friendly_name.clone(),
        ));
        let person_api = Arc::new(MainApiPersonService::new(client));

        let backend = create_cache_backend(&config.redis).await;
        tracing::info!(mode = %backend.stats().mode, "cache backend ready");

        Ok(Self::from_parts(
            config,
            Arc::new(backend),
            permission_api,
            person_api,
            local_persons,
        ))
    }

    /// Build from explicit collaborators.
    pub fn from_parts(
        config: &AuthzConfig,
        store: Arc<dyn CacheStore>,
        permission_api: Arc<dyn PermissionApi>,
        person_api: Arc<dyn PersonApi>,
        local_persons: Arc<dyn LocalPersonRepository>,
    ) -> Self {
        let manager = CacheManager::new(store);
        let person_cache = Arc::new(PersonCache::new(manager.clone(), person_api, &config.cache));
        let permission_cache = Arc::new(PermissionCache::new(
            manager,
            permission_api,
            &config.cache,
        ));
        let augmenter = ClaimsAugmenter::new(
            local_persons,
            person_cache.clone(),
            permission_cache.clone(),
            config.claims.clone(),
        );

        Self {
            person_cache,
            permission_cache,
            augmenter,
        }
    }
}
