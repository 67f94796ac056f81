//! Person record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person as returned by the remote person authority.
///
/// A snapshot: a cached `Person` only changes when its entry expires or is
/// invalidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// External (Azure AD) object id.
    pub azure_oid: Uuid,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    /// The person is an application identity rather than a human.
    #[serde(default)]
    pub service_principal: bool,

    /// Superusers get the superuser role regardless of plant.
    #[serde(default, rename = "super")]
    pub is_superuser: bool,

    /// Numeric id in the main API.
    #[serde(default)]
    pub id: i64,
}

impl Person {
    /// "First Last", falling back to the user name and then the oid.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !full.is_empty() {
            full
        } else if let Some(user_name) = self.user_name.as_deref().filter(|s| !s.is_empty()) {
            user_name.to_string()
        } else {
            self.azure_oid.to_string()
        }
    }
}
