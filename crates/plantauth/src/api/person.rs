//! Person authority backed by the main API.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::PersonApi;
use super::client::MainApiClient;
use crate::error::AuthzResult;
use crate::types::Person;

/// Reads persons from the main API as the application.
///
/// The person endpoints require an application role, so these calls never
/// use a user token.
pub struct MainApiPersonService {
    client: Arc<MainApiClient>,
}

impl MainApiPersonService {
    pub fn new(client: Arc<MainApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PersonApi for MainApiPersonService {
    async fn try_get_person_by_oid(
        &self,
        user_oid: Uuid,
        cancel: &CancellationToken,
    ) -> AuthzResult<Option<Person>> {
        let oid = user_oid.hyphenated().to_string();
        let url = self.client.url(
            "Person",
            &[("azureOid", oid.as_str()), ("includeVoidedPerson", "false")],
        )?;

        let person: Option<Option<Person>> = self
            .client
            .try_query_and_deserialize(&url, None, cancel)
            .await?;
        Ok(person.flatten())
    }

    async fn get_all_persons(
        &self,
        plant_id: &str,
        cancel: &CancellationToken,
    ) -> AuthzResult<Vec<Person>> {
        let url = self
            .client
            .url("Person/AllPersons", &[("plantId", plant_id)])?;

        let persons: Option<Option<Vec<Person>>> = self
            .client
            .try_query_and_deserialize(&url, None, cancel)
            .await?;
        Ok(persons.flatten().unwrap_or_default())
    }
}
