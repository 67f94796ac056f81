//! Cache key builders.
//!
//! Keys are namespaced by category and the uppercased user oid, plus the
//! plant id where the entry is scoped to a (user, plant) pair:
//!
//! | Key | Entry |
//! |-----|-------|
//! | `PLANTS_<OID>` | all plants for the user |
//! | `PROJECTS_<OID>_<PLANT>` | all open projects in the plant |
//! | `PERMISSIONS_<OID>_<PLANT>` | permission codes |
//! | `RESTRICTIONS_<OID>_<PLANT>` | restriction-role codes |
//! | `USERPLANTDATA_<OID>_<PLANT>` | the aggregate of the four above |
//! | `PERSONS_<OID>` | one person |
//! | `PERSONLIST_<PLANT>` | all persons in a plant |
//!
//! A nil oid would make every user share the same keys, so the builders
//! reject it before any I/O happens.

use uuid::Uuid;

use crate::error::{AuthzError, AuthzResult};

pub fn plants(user_oid: Uuid) -> AuthzResult<String> {
    Ok(format!("PLANTS_{}", oid_part(user_oid)?))
}

pub fn projects(plant_id: &str, user_oid: Uuid) -> AuthzResult<String> {
    scoped("PROJECTS", plant_id, user_oid)
}

pub fn permissions(plant_id: &str, user_oid: Uuid) -> AuthzResult<String> {
    scoped("PERMISSIONS", plant_id, user_oid)
}

pub fn restriction_roles(plant_id: &str, user_oid: Uuid) -> AuthzResult<String> {
    scoped("RESTRICTIONS", plant_id, user_oid)
}

pub fn user_plant_data(plant_id: &str, user_oid: Uuid) -> AuthzResult<String> {
    scoped("USERPLANTDATA", plant_id, user_oid)
}

pub fn persons(user_oid: Uuid) -> AuthzResult<String> {
    Ok(format!("PERSONS_{}", oid_part(user_oid)?))
}

pub fn person_list(plant_id: &str) -> AuthzResult<String> {
    Ok(format!("PERSONLIST_{}", plant_part(plant_id)?.to_uppercase()))
}

/// Every key that must be removed together for a (user, plant) pair.
pub fn all_for_user_in_plant(plant_id: &str, user_oid: Uuid) -> AuthzResult<[String; 5]> {
    Ok([
        plants(user_oid)?,
        projects(plant_id, user_oid)?,
        permissions(plant_id, user_oid)?,
        restriction_roles(plant_id, user_oid)?,
        user_plant_data(plant_id, user_oid)?,
    ])
}

fn scoped(category: &str, plant_id: &str, user_oid: Uuid) -> AuthzResult<String> {
    Ok(format!(
        "{category}_{}_{}",
        oid_part(user_oid)?,
        plant_part(plant_id)?
    ))
}

fn oid_part(user_oid: Uuid) -> AuthzResult<String> {
    if user_oid.is_nil() {
        return Err(AuthzError::invalid_cache_key("user oid is nil"));
    }
    Ok(user_oid.hyphenated().to_string().to_uppercase())
}

fn plant_part(plant_id: &str) -> AuthzResult<&str> {
    if plant_id.trim().is_empty() {
        return Err(AuthzError::invalid_cache_key("plant id is empty"));
    }
    Ok(plant_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OID: &str = "8f0b3f6c-52ab-4e38-9b8c-0e2b6d4a9c11";

    fn oid() -> Uuid {
        Uuid::parse_str(OID).unwrap()
    }

    #[test]
    fn test_key_formats() {
        let upper = OID.to_uppercase();

        assert_eq!(plants(oid()).unwrap(), format!("PLANTS_{upper}"));
        assert_eq!(
            projects("PCS$A", oid()).unwrap(),
            format!("PROJECTS_{upper}_PCS$A")
        );
        assert_eq!(
            permissions("PCS$A", oid()).unwrap(),
            format!("PERMISSIONS_{upper}_PCS$A")
        );
        assert_eq!(
            restriction_roles("PCS$A", oid()).unwrap(),
            format!("RESTRICTIONS_{upper}_PCS$A")
        );
        assert_eq!(
            user_plant_data("PCS$A", oid()).unwrap(),
            format!("USERPLANTDATA_{upper}_PCS$A")
        );
        assert_eq!(persons(oid()).unwrap(), format!("PERSONS_{upper}"));
        assert_eq!(person_list("pcs$a").unwrap(), "PERSONLIST_PCS$A");
    }

    #[test]
    fn test_nil_oid_rejected_by_every_user_key() {
        let nil = Uuid::nil();
        let results = [
            plants(nil),
            projects("PCS$A", nil),
            permissions("PCS$A", nil),
            restriction_roles("PCS$A", nil),
            user_plant_data("PCS$A", nil),
            persons(nil),
        ];

        for result in results {
            let err = result.unwrap_err();
            assert!(err.is_programming_error(), "{err}");
        }
        assert!(all_for_user_in_plant("PCS$A", nil).is_err());
    }

    #[test]
    fn test_empty_plant_rejected() {
        assert!(permissions("", oid()).is_err());
        assert!(person_list(" ").is_err());
    }

    #[test]
    fn test_all_for_user_in_plant_is_five_distinct_keys() {
        let keys = all_for_user_in_plant("PCS$A", oid()).unwrap();
        let unique: std::collections::HashSet<&String> = keys.iter().collect();
        assert_eq!(unique.len(), 5);
    }
}
