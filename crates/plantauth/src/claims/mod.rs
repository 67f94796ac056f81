//! Claims model and augmentation.
//!
//! Claim values added by augmentation:
//!
//! | Type | Value |
//! |------|-------|
//! | Role | `SUPERUSER` |
//! | Role | each permission code, e.g. `TAG/READ` |
//! | UserData | `PERSON-EXISTS##<oid>` |
//! | UserData | `PROJECT##<name>` and `PROJECT##<guid>` per accessible project |
//! | UserData | `RESTRICTIONROLE##<code>` per restriction role |

pub mod augment;
pub mod model;
pub mod restrictions;
pub mod set;

use std::fmt::Display;

pub use augment::{ClaimsAugmenter, LocalPersonRepository, NoLocalPersons, PlantProvider, RequestPlant};
pub use model::{Claim, ClaimType, ClaimsIdentity, ClaimsPrincipal};
pub use restrictions::RestrictionRolesChecker;
pub use set::ClaimSet;

pub const SUPERUSER: &str = "SUPERUSER";
pub const PERSON_EXISTS_PREFIX: &str = "PERSON-EXISTS##";
pub const PROJECT_PREFIX: &str = "PROJECT##";
pub const RESTRICTION_ROLE_PREFIX: &str = "RESTRICTIONROLE##";

/// Restriction role meaning "no restrictions apply".
pub const NO_RESTRICTIONS: &str = "%";

/// Claim value for a project, by name or by guid.
pub fn project_claim_value(project: impl Display) -> String {
    format!("{PROJECT_PREFIX}{project}")
}

pub fn restriction_role_claim_value(code: impl Display) -> String {
    format!("{RESTRICTION_ROLE_PREFIX}{code}")
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_claim_values() {
        let guid = Uuid::parse_str("0d6a1f7e-3c55-4d8e-a1c1-2f0e8b9e4c7a").unwrap();

        assert_eq!(project_claim_value("P1"), "PROJECT##P1");
        assert_eq!(
            project_claim_value(guid),
            "PROJECT##0d6a1f7e-3c55-4d8e-a1c1-2f0e8b9e4c7a"
        );
        assert_eq!(restriction_role_claim_value("%"), "RESTRICTIONROLE##%");
    }
}
