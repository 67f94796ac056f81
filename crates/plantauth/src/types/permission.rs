//! Plants, projects and the per-(user, plant) permission aggregate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One plant in a user's plant list. The list includes plants the user has
/// no access to, so "unknown plant" and "no access" can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessablePlant {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub has_access: bool,
}

/// One project in a plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessableProject {
    #[serde(rename = "proCoSysGuid")]
    pub id: Uuid,
    pub name: String,
    pub has_access: bool,
}

/// Everything needed to authorize a user within one plant, fetched in one
/// fan-out and cached as one entry.
///
/// The plant and project lists are stored unfiltered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPlantPermissionData {
    pub user_oid: Uuid,
    pub plant_id: String,
    pub all_plants_for_user: Vec<AccessablePlant>,
    pub permissions: Vec<String>,
    pub projects: Vec<AccessableProject>,
    pub restriction_roles: Vec<String>,
}

impl UserPlantPermissionData {
    /// Returns `true` if `plant_id` is in the plant list with access.
    #[must_use]
    pub fn has_access_to_plant(&self, plant_id: &str) -> bool {
        self.all_plants_for_user
            .iter()
            .any(|p| p.id == plant_id && p.has_access)
    }

    /// Projects in this plant the user has access to.
    pub fn accessible_projects(&self) -> impl Iterator<Item = &AccessableProject> {
        self.projects.iter().filter(|p| p.has_access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant(id: &str, has_access: bool) -> AccessablePlant {
        AccessablePlant {
            id: id.to_string(),
            title: format!("{id} title"),
            has_access,
        }
    }

    fn project(name: &str, has_access: bool) -> AccessableProject {
        AccessableProject {
            id: Uuid::new_v4(),
            name: name.to_string(),
            has_access,
        }
    }

    #[test]
    fn test_has_access_to_plant() {
        let data = UserPlantPermissionData {
            user_oid: Uuid::new_v4(),
            plant_id: "PCS$A".to_string(),
            all_plants_for_user: vec![plant("PCS$A", true), plant("PCS$B", false)],
            permissions: vec![],
            projects: vec![],
            restriction_roles: vec![],
        };

        assert!(data.has_access_to_plant("PCS$A"));
        assert!(!data.has_access_to_plant("PCS$B"));
        assert!(!data.has_access_to_plant("PCS$UNKNOWN"));
    }

    #[test]
    fn test_accessible_projects_filters() {
        let data = UserPlantPermissionData {
            user_oid: Uuid::new_v4(),
            plant_id: "PCS$A".to_string(),
            all_plants_for_user: vec![],
            permissions: vec![],
            projects: vec![project("P1", true), project("P2", false), project("P3", true)],
            restriction_roles: vec![],
        };

        let names: Vec<&str> = data.accessible_projects().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["P1", "P3"]);
    }

    #[test]
    fn test_project_wire_format() {
        let json = r#"{"proCoSysGuid": "0d6a1f7e-3c55-4d8e-a1c1-2f0e8b9e4c7a", "name": "PRJ", "hasAccess": true}"#;
        let project: AccessableProject = serde_json::from_str(json).unwrap();
        assert_eq!(project.name, "PRJ");
        assert!(project.has_access);
    }
}
