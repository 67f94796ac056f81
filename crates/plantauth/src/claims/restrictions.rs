//! Restriction role checks over an augmented principal.

use super::model::ClaimsPrincipal;
use super::{NO_RESTRICTIONS, RESTRICTION_ROLE_PREFIX};

/// Reads the restriction-role claims a given issuer added to a principal.
///
/// Claims from other issuers are ignored, so a token cannot grant itself
/// restriction roles.
#[derive(Debug, Clone)]
pub struct RestrictionRolesChecker {
    issuer: String,
}

impl RestrictionRolesChecker {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    /// The restriction-role codes, without their claim prefix.
    pub fn restriction_roles<'a>(
        &'a self,
        principal: &'a ClaimsPrincipal,
    ) -> impl Iterator<Item = &'a str> {
        principal.user_data_issued_by(RESTRICTION_ROLE_PREFIX, &self.issuer)
    }

    /// `true` if the user is explicitly unrestricted (the `%` role).
    #[must_use]
    pub fn has_explicit_no_restrictions(&self, principal: &ClaimsPrincipal) -> bool {
        self.restriction_roles(principal)
            .any(|role| role == NO_RESTRICTIONS)
    }

    /// `true` if the user holds the restriction role `responsible_code`.
    /// Codes are compared case-sensitively.
    #[must_use]
    pub fn has_explicit_access_to_content(
        &self,
        principal: &ClaimsPrincipal,
        responsible_code: &str,
    ) -> bool {
        self.restriction_roles(principal)
            .any(|role| role == responsible_code)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::claims::model::{Claim, ClaimType};
    use crate::claims::restriction_role_claim_value;

    fn principal_with(values: &[(&str, Option<&str>)]) -> ClaimsPrincipal {
        let mut principal = ClaimsPrincipal::with_oid(Uuid::new_v4());
        let identity = principal.identity_mut_or_insert("PlantAuth");
        for (code, issuer) in values {
            let mut claim = Claim::new(ClaimType::UserData, restriction_role_claim_value(code));
            claim.issuer = issuer.map(str::to_string);
            identity.add_claim(claim);
        }
        principal
    }

    #[test]
    fn test_no_restrictions_sentinel() {
        let checker = RestrictionRolesChecker::new("PlantAuth");

        let unrestricted = principal_with(&[("%", Some("PlantAuth"))]);
        assert!(checker.has_explicit_no_restrictions(&unrestricted));

        let restricted = principal_with(&[("R1", Some("PlantAuth"))]);
        assert!(!checker.has_explicit_no_restrictions(&restricted));
    }

    #[test]
    fn test_explicit_access_is_case_sensitive() {
        let checker = RestrictionRolesChecker::new("PlantAuth");
        let principal = principal_with(&[("R1", Some("PlantAuth")), ("R2", Some("PlantAuth"))]);

        assert!(checker.has_explicit_access_to_content(&principal, "R1"));
        assert!(!checker.has_explicit_access_to_content(&principal, "r1"));
        assert!(!checker.has_explicit_access_to_content(&principal, "R3"));

        let mut roles: Vec<&str> = checker.restriction_roles(&principal).collect();
        roles.sort_unstable();
        assert_eq!(roles, vec!["R1", "R2"]);
    }

    #[test]
    fn test_other_issuers_ignored() {
        let checker = RestrictionRolesChecker::new("PlantAuth");
        let principal = principal_with(&[("%", Some("Other")), ("R1", None)]);

        assert!(!checker.has_explicit_no_restrictions(&principal));
        assert!(!checker.has_explicit_access_to_content(&principal, "R1"));
    }
}
