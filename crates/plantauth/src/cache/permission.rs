//! Permission cache.
//!
//! Caches, per user:
//!  * the list of plants, including plants without access (TTL class Plant)
//!  * per plant: projects, permissions and restriction roles (TTL class Permission)
//!  * per plant: the aggregate of all four, fetched in one fan-out
//!
//! The five entries for a (user, plant) pair are invalidated together by
//! [`PermissionCache::invalidate_all`].

use std::sync::Arc;

use plantauth_cache::{CacheDuration, CacheManager};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::keys;
use crate::api::PermissionApi;
use crate::config::CacheOptions;
use crate::error::{AuthzError, AuthzResult};
use crate::types::{AccessablePlant, AccessableProject, UserPlantPermissionData};

/// How a project is identified in [`PermissionCache::is_valid_project`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectRef<'a> {
    Name(&'a str),
    Guid(Uuid),
}

impl ProjectRef<'_> {
    fn matches(&self, project: &AccessableProject) -> bool {
        match self {
            ProjectRef::Name(name) => project.name == *name,
            ProjectRef::Guid(id) => project.id == *id,
        }
    }
}

/// Cache-aside over the remote permission authority.
pub struct PermissionCache {
    cache: CacheManager,
    api: Arc<dyn PermissionApi>,
    plant_duration: CacheDuration,
    permission_duration: CacheDuration,
}

impl PermissionCache {
    pub fn new(cache: CacheManager, api: Arc<dyn PermissionApi>, options: &CacheOptions) -> Self {
        Self {
            cache,
            api,
            plant_duration: options.plant_duration(),
            permission_duration: options.permission_duration(),
        }
    }

    // =========================================================================
    // Plants
    // =========================================================================

    /// Ids of the plants the user has access to.
    pub async fn get_plant_ids_with_access(
        &self,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<String>> {
        Ok(self
            .get_all_plants(user_oid, cancel)
            .await?
            .into_iter()
            .filter(|p| p.has_access)
            .map(|p| p.id)
            .collect())
    }

    pub async fn has_access_to_plant(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<bool> {
        Ok(self
            .get_all_plants(user_oid, cancel)
            .await?
            .iter()
            .any(|p| p.id == plant_id && p.has_access))
    }

    /// `true` if the plant is known for the user, with or without access.
    ///
    /// Lets callers tell "unknown plant" from "no access".
    pub async fn is_valid_plant(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<bool> {
        Ok(self
            .get_all_plants(user_oid, cancel)
            .await?
            .iter()
            .any(|p| p.id == plant_id))
    }

    pub async fn get_plant_title(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Option<String>> {
        Ok(self
            .get_all_plants(user_oid, cancel)
            .await?
            .into_iter()
            .find(|p| p.id == plant_id)
            .map(|p| p.title))
    }

    // =========================================================================
    // Plant-scoped lookups
    // =========================================================================

    pub async fn get_permissions(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<String>> {
        let key = keys::permissions(plant_id, user_oid)?;
        let api = &self.api;

        self.cache
            .get_or_create(
                &key,
                move |token| async move {
                    api.get_permissions_for_user(plant_id, user_oid, &token).await
                },
                self.permission_duration,
                cancel,
            )
            .await
    }

    /// Projects in the plant the user has access to.
    pub async fn get_projects(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<AccessableProject>> {
        Ok(self
            .all_projects(plant_id, user_oid, cancel)
            .await?
            .into_iter()
            .filter(|p| p.has_access)
            .collect())
    }

    pub async fn get_project_names(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<String>> {
        Ok(self
            .get_projects(plant_id, user_oid, cancel)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect())
    }

    /// `true` if the project exists in the plant, with or without access.
    pub async fn is_valid_project(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        project: ProjectRef<'_>,
        cancel: &CancellationToken,
    ) -> AuthzResult<bool> {
        Ok(self
            .all_projects(plant_id, user_oid, cancel)
            .await?
            .iter()
            .any(|p| project.matches(p)))
    }

    pub async fn get_restriction_roles(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<String>> {
        let key = keys::restriction_roles(plant_id, user_oid)?;
        let api = &self.api;

        self.cache
            .get_or_create(
                &key,
                move |token| async move {
                    api.get_restriction_roles_for_user(plant_id, user_oid, &token)
                        .await
                },
                self.permission_duration,
                cancel,
            )
            .await
    }

    // =========================================================================
    // Aggregate
    // =========================================================================

    /// Everything needed to authorize the user in the plant.
    ///
    /// On a miss the four remote calls run concurrently and all of them are
    /// awaited. If any failed, the first failure (plants, permissions,
    /// projects, restriction roles) is returned and nothing is cached.
    pub async fn get_user_plant_permission_data(
        &self,
        user_oid: Uuid,
        plant_id: &str,
        cancel: &CancellationToken,
    ) -> AuthzResult<UserPlantPermissionData> {
        let key = keys::user_plant_data(plant_id, user_oid)?;
        let api = &self.api;

        self.cache
            .get_or_create(
                &key,
                move |token| async move {
                    let (plants, permissions, projects, restriction_roles) = tokio::join!(
                        api.get_all_plants_for_user(user_oid, &token),
                        api.get_permissions_for_user(plant_id, user_oid, &token),
                        api.get_all_open_projects_for_user(plant_id, user_oid, &token),
                        api.get_restriction_roles_for_user(plant_id, user_oid, &token),
                    );

                    Ok::<_, AuthzError>(UserPlantPermissionData {
                        user_oid,
                        plant_id: plant_id.to_string(),
                        all_plants_for_user: plants?,
                        permissions: permissions?,
                        projects: projects?,
                        restriction_roles: restriction_roles?,
                    })
                },
                self.permission_duration,
                cancel,
            )
            .await
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    /// Remove the plant list, projects, permissions, restriction roles and
    /// aggregate entries for the user in the plant.
    ///
    /// All five removals are issued and awaited before returning, even if
    /// one of them fails. The first failure is then returned.
    pub async fn invalidate_all(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<()> {
        let keys = keys::all_for_user_in_plant(plant_id, user_oid)?;

        let results =
            futures::future::join_all(keys.iter().map(|key| self.cache.remove(key, cancel))).await;
        results.into_iter().collect::<Result<Vec<()>, _>>()?;

        tracing::info!(
            user_oid = %user_oid,
            plant_id = %plant_id,
            "permission cache invalidated"
        );
        Ok(())
    }

    /// All plants known for the user, including plants without access.
    pub async fn get_all_plants(
        &self,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<AccessablePlant>> {
        let key = keys::plants(user_oid)?;
        let api = &self.api;

        self.cache
            .get_or_create(
                &key,
                move |token| async move { api.get_all_plants_for_user(user_oid, &token).await },
                self.plant_duration,
                cancel,
            )
            .await
    }

    async fn all_projects(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<AccessableProject>> {
        let key = keys::projects(plant_id, user_oid)?;
        let api = &self.api;

        self.cache
            .get_or_create(
                &key,
                move |token| async move {
                    api.get_all_open_projects_for_user(plant_id, user_oid, &token)
                        .await
                },
                self.permission_duration,
                cancel,
            )
            .await
    }
}
