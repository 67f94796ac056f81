//! Remote authorities.
//!
//! The caches depend only on the [`PermissionApi`] and [`PersonApi`] traits.
//! [`MainApiPermissionService`] and [`MainApiPersonService`] implement them
//! over HTTP through a shared [`MainApiClient`].
//!
//! Every call takes the user and plant explicitly; there is no ambient
//! "current user". User-scoped calls are made with a token issued on behalf
//! of that user.

pub mod client;
pub mod permission;
pub mod person;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AuthzResult;
use crate::types::{AccessablePlant, AccessableProject, Person};

pub use client::{BearerTokenProvider, MainApiClient, StaticBearerToken};
pub use permission::MainApiPermissionService;
pub use person::MainApiPersonService;

/// Source of truth for plants, permissions, projects and restriction roles.
///
/// Every call is assumed idempotent and cacheable.
#[async_trait]
pub trait PermissionApi: Send + Sync {
    /// All plants known for the user, including plants without access.
    async fn get_all_plants_for_user(
        &self,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<AccessablePlant>>;

    async fn get_permissions_for_user(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<String>>;

    /// All open projects in the plant, including projects without access.
    async fn get_all_open_projects_for_user(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<AccessableProject>>;

    async fn get_restriction_roles_for_user(
        &self,
        plant_id: &str,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<String>>;
}

/// Source of truth for persons.
#[async_trait]
pub trait PersonApi: Send + Sync {
    /// `None` if the authority does not know the person.
    async fn try_get_person_by_oid(
        &self,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Option<Person>>;

    /// All persons in a plant (tenant).
    async fn get_all_persons(
        &self,
        plant_id: &str,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<Person>>;
}
