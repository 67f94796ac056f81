//! Counting in-memory authorities for unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use plantauth_cache::{CacheBackend, CacheManager};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::{PermissionApi, PersonApi};
use crate::error::{AuthzError, AuthzResult};
use crate::types::{AccessablePlant, AccessableProject, Person};

pub(crate) fn local_manager() -> CacheManager {
    CacheManager::new(Arc::new(CacheBackend::new_local()))
}

pub(crate) fn person(oid: Uuid, is_superuser: bool) -> Person {
    Person {
        azure_oid: oid,
        user_name: Some("USER".to_string()),
        first_name: Some("Test".to_string()),
        last_name: Some("User".to_string()),
        email: None,
        service_principal: false,
        is_superuser,
        id: 1,
    }
}

pub(crate) fn plant(id: &str, has_access: bool) -> AccessablePlant {
    AccessablePlant {
        id: id.to_string(),
        title: format!("Title of {id}"),
        has_access,
    }
}

pub(crate) fn project(name: &str, has_access: bool) -> AccessableProject {
    AccessableProject {
        id: Uuid::new_v4(),
        name: name.to_string(),
        has_access,
    }
}

#[derive(Default)]
pub(crate) struct FakePersonApi {
    persons: Vec<Person>,
    pub person_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl FakePersonApi {
    pub fn with_person(person: Person) -> Self {
        Self {
            persons: vec![person],
            ..Self::default()
        }
    }
}

#[async_trait]
impl PersonApi for FakePersonApi {
    async fn try_get_person_by_oid(
        &self,
        user_oid: Uuid,
        _cancel: &CancellationToken,
    ) -> AuthzResult<Option<Person>> {
        self.person_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.persons.iter().find(|p| p.azure_oid == user_oid).cloned())
    }

    async fn get_all_persons(
        &self,
        _plant_id: &str,
        _cancel: &CancellationToken,
    ) -> AuthzResult<Vec<Person>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.persons.clone())
    }
}

/// Serves fixed data per plant and counts calls per operation.
#[derive(Default)]
pub(crate) struct FakePermissionApi {
    pub plants: Mutex<Vec<AccessablePlant>>,
    pub permissions: Mutex<HashMap<String, Vec<String>>>,
    pub projects: Mutex<HashMap<String, Vec<AccessableProject>>>,
    pub restriction_roles: Mutex<HashMap<String, Vec<String>>>,
    pub fail_projects: AtomicBool,
    pub plant_calls: AtomicUsize,
    pub permission_calls: AtomicUsize,
    pub project_calls: AtomicUsize,
    pub restriction_calls: AtomicUsize,
}

impl FakePermissionApi {
    pub fn calls(&self) -> [usize; 4] {
        [
            self.plant_calls.load(Ordering::SeqCst),
            self.permission_calls.load(Ordering::SeqCst),
            self.project_calls.load(Ordering::SeqCst),
            self.restriction_calls.load(Ordering::SeqCst),
        ]
    }
}

#[async_trait]
impl PermissionApi for FakePermissionApi {
    async fn get_all_plants_for_user(
        &self,
        _user_oid: Uuid,
        _cancel: &CancellationToken,
    ) -> AuthzResult<Vec<AccessablePlant>> {
        self.plant_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.plants.lock().unwrap().clone())
    }

    async fn get_permissions_for_user(
        &self,
        plant_id: &str,
        _user_oid: Uuid,
        _cancel: &CancellationToken,
    ) -> AuthzResult<Vec<String>> {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .permissions
            .lock()
            .unwrap()
            .get(plant_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_all_open_projects_for_user(
        &self,
        plant_id: &str,
        _user_oid: Uuid,
        _cancel: &CancellationToken,
    ) -> AuthzResult<Vec<AccessableProject>> {
        self.project_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_projects.load(Ordering::SeqCst) {
            return Err(AuthzError::remote("fake://Projects", Some(503), "unavailable"));
        }
        Ok(self
            .projects
            .lock()
            .unwrap()
            .get(plant_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_restriction_roles_for_user(
        &self,
        plant_id: &str,
        _user_oid: Uuid,
        _cancel: &CancellationToken,
    ) -> AuthzResult<Vec<String>> {
        self.restriction_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .restriction_roles
            .lock()
            .unwrap()
            .get(plant_id)
            .cloned()
            .unwrap_or_default())
    }
}
