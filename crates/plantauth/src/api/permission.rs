//! Permission authority backed by the main API.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::PermissionApi;
use super::client::MainApiClient;
use crate::error::AuthzResult;
use crate::types::{AccessablePlant, AccessableProject};

/// Reads plants, permissions, projects and content restrictions from the
/// main API.
pub struct MainApiPermissionService {
    client: Arc<MainApiClient>,
    client_friendly_name: String,
}

impl MainApiPermissionService {
    pub fn new(client: Arc<MainApiClient>, client_friendly_name: impl Into<String>) -> Self {
        Self {
            client,
            client_friendly_name: client_friendly_name.into(),
        }
    }

    /// Record that the user used `plant_id`. Sent whenever projects are
    /// fetched, which clients do at startup.
    async fn trace_plant(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<()> {
        let url = self.client.url("Me/TracePlant", &[("plantId", plant_id)])?;
        self.client
            .post_json(&url, &self.client_friendly_name, Some(user_oid), cancel)
            .await
    }
}

#[async_trait]
impl PermissionApi for MainApiPermissionService {
    async fn get_all_plants_for_user(
        &self,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<AccessablePlant>> {
        let oid = user_oid.hyphenated().to_string();
        let url = self.client.url(
            "Plants/ForUser",
            &[("azureOid", oid.as_str()), ("includePlantsWithoutAccess", "true")],
        )?;

        let plants: Option<Vec<AccessablePlant>> =
            self.client.query_and_deserialize(&url, None, cancel).await?;
        Ok(plants.unwrap_or_default())
    }

    async fn get_permissions_for_user(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<String>> {
        let url = self.client.url("Permissions", &[("plantId", plant_id)])?;

        let permissions: Option<Vec<String>> = self
            .client
            .query_and_deserialize(&url, Some(user_oid), cancel)
            .await?;
        Ok(permissions.unwrap_or_default())
    }

    async fn get_all_open_projects_for_user(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<AccessableProject>> {
        self.trace_plant(plant_id, user_oid, cancel).await?;

        let url = self.client.url(
            "Projects",
            &[
                ("plantId", plant_id),
                ("withCommPkgsOnly", "false"),
                ("includeProjectsWithoutAccess", "true"),
            ],
        )?;

        let projects: Option<Vec<AccessableProject>> = self
            .client
            .query_and_deserialize(&url, Some(user_oid), cancel)
            .await?;
        Ok(projects.unwrap_or_default())
    }

    async fn get_restriction_roles_for_user(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<String>> {
        let url = self
            .client
            .url("ContentRestrictions", &[("plantId", plant_id)])?;

        let roles: Option<Vec<String>> = self
            .client
            .query_and_deserialize(&url, Some(user_oid), cancel)
            .await?;
        Ok(roles.unwrap_or_default())
    }
}
