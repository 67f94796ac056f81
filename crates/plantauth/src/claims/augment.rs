//! Claims augmentation.
//!
//! Runs once per authenticated request:
//!
//! 1. No object id on the principal: leave it unchanged.
//! 2. Resolve the person (local repository first, then the person cache).
//!    Unknown person: leave it unchanged.
//! 3. Replace everything this issuer added before.
//! 4. Add the person-exists marker.
//! 5. Superusers get the `SUPERUSER` role, with or without a plant.
//! 6. No plant for this request: stop.
//! 7. No access to the plant: stop.
//! 8. Add a role per permission, two project claims per accessible project
//!    and a claim per restriction role, unless suppressed.
//!
//! Early exits are not errors. Cache and remote-authority failures are, and
//! fail the whole run without touching the principal.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::model::{ClaimType, ClaimsPrincipal};
use super::set::ClaimSet;
use super::{PERSON_EXISTS_PREFIX, SUPERUSER, project_claim_value, restriction_role_claim_value};
use crate::cache::{PermissionCache, PersonCache};
use crate::config::ClaimsOptions;
use crate::error::AuthzResult;
use crate::types::Person;

/// Fast-path person lookup consulted before the person cache, e.g. a table
/// of persons the embedding application already stores.
#[async_trait]
pub trait LocalPersonRepository: Send + Sync {
    async fn get(&self, user_oid: Uuid, cancel: &CancellationToken) -> AuthzResult<Option<Person>>;
}

/// For applications without a local person store.
pub struct NoLocalPersons;

#[async_trait]
impl LocalPersonRepository for NoLocalPersons {
    async fn get(
        &self,
        _user_oid: Uuid,
        _cancel: &CancellationToken,
    ) -> AuthzResult<Option<Person>> {
        Ok(None)
    }
}

/// The plant a request is scoped to, if any.
pub trait PlantProvider: Send + Sync {
    fn plant(&self) -> Option<&str>;
}

/// A plant taken from the request, e.g. from a header. An empty value
/// counts as no plant.
#[derive(Debug, Clone, Default)]
pub struct RequestPlant(pub Option<String>);

impl RequestPlant {
    pub fn new(plant: impl Into<String>) -> Self {
        Self(Some(plant.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl PlantProvider for RequestPlant {
    fn plant(&self) -> Option<&str> {
        self.0.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// Adds person, permission, project and restriction-role claims to a
/// principal.
pub struct ClaimsAugmenter {
    local_persons: Arc<dyn LocalPersonRepository>,
    person_cache: Arc<PersonCache>,
    permission_cache: Arc<PermissionCache>,
    options: ClaimsOptions,
}

impl ClaimsAugmenter {
    pub fn new(
        local_persons: Arc<dyn LocalPersonRepository>,
        person_cache: Arc<PersonCache>,
        permission_cache: Arc<PermissionCache>,
        options: ClaimsOptions,
    ) -> Self {
        Self {
            local_persons,
            person_cache,
            permission_cache,
            options,
        }
    }

    /// Issuer of every claim this augmenter adds.
    pub fn issuer(&self) -> &str {
        &self.options.issuer
    }

    /// Augment `principal` in place.
    ///
    /// The principal is only modified after every lookup succeeded; on
    /// error or cancellation it is left as it was.
    pub async fn augment(
        &self,
        principal: &mut ClaimsPrincipal,
        plant: &dyn PlantProvider,
        cancel: &CancellationToken,
    ) -> AuthzResult<()> {
        if let Some(claims) = self.resolve(principal, plant, cancel).await? {
            claims.apply(principal, &self.options.issuer);
        }
        Ok(())
    }

    /// Compute the claims for `principal` without applying them.
    ///
    /// `None` means the principal must be left unchanged (not authenticated,
    /// or not a known person).
    pub async fn resolve(
        &self,
        principal: &ClaimsPrincipal,
        plant: &dyn PlantProvider,
        cancel: &CancellationToken,
    ) -> AuthzResult<Option<ClaimSet>> {
        let Some(user_oid) = principal.oid() else {
            tracing::debug!("claims augmentation early exit, not authenticated");
            return Ok(None);
        };

        let Some(person) = self.find_person(user_oid, cancel).await? else {
            tracing::info!(user_oid = %user_oid, "claims augmentation early exit, unknown person");
            return Ok(None);
        };

        let mut claims = vec![(
            ClaimType::UserData,
            format!("{PERSON_EXISTS_PREFIX}{user_oid}"),
        )];

        if person.is_superuser {
            tracing::info!(user_oid = %user_oid, "logged in as a superuser");
            claims.push((ClaimType::Role, SUPERUSER.to_string()));
        }

        let Some(plant_id) = plant.plant() else {
            tracing::debug!(user_oid = %user_oid, "claims augmentation early exit, not a plant request");
            return Ok(Some(claims.into_iter().collect()));
        };

        if !self
            .permission_cache
            .has_access_to_plant(plant_id, user_oid, cancel)
            .await?
        {
            tracing::info!(
                user_oid = %user_oid,
                plant_id = %plant_id,
                "claims augmentation early exit, no access to plant"
            );
            return Ok(Some(claims.into_iter().collect()));
        }

        let data = self
            .permission_cache
            .get_user_plant_permission_data(user_oid, plant_id, cancel)
            .await?;

        claims.extend(
            data.permissions
                .iter()
                .map(|permission| (ClaimType::Role, permission.clone())),
        );

        if !self.options.disable_project_user_data_claims {
            for project in data.accessible_projects() {
                claims.push((ClaimType::UserData, project_claim_value(&project.name)));
                claims.push((ClaimType::UserData, project_claim_value(project.id)));
            }
        }

        if !self.options.disable_restriction_role_user_data_claims {
            claims.extend(
                data.restriction_roles
                    .iter()
                    .map(|role| (ClaimType::UserData, restriction_role_claim_value(role))),
            );
        }

        let claims: ClaimSet = claims.into_iter().collect();
        tracing::debug!(
            user_oid = %user_oid,
            plant_id = %plant_id,
            claims = claims.len(),
            "claims augmentation completed"
        );
        Ok(Some(claims))
    }

    async fn find_person(
        &self,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Option<Person>> {
        if let Some(person) = self.local_persons.get(user_oid, cancel).await? {
            return Ok(Some(person));
        }
        self.person_cache.get(user_oid, cancel).await
    }
}
