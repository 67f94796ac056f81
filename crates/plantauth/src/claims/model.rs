//! Claims carried by an authenticated principal.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PERSON_EXISTS_PREFIX;

const OBJECT_ID_URI: &str = "http://schemas.microsoft.com/identity/claims/objectidentifier";
const ROLE_URI: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";
const USER_DATA_URI: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/userdata";

/// Claim type.
///
/// The well-known types serialize to their claim type URIs; the short
/// `oid` form issued in access tokens also parses as [`ClaimType::ObjectId`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClaimType {
    /// External user identifier.
    ObjectId,
    Role,
    UserData,
    Custom(String),
}

impl ClaimType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ObjectId => OBJECT_ID_URI,
            Self::Role => ROLE_URI,
            Self::UserData => USER_DATA_URI,
            Self::Custom(s) => s,
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ClaimType {
    fn from(value: String) -> Self {
        match value.as_str() {
            OBJECT_ID_URI | "oid" => Self::ObjectId,
            ROLE_URI | "role" | "roles" => Self::Role,
            USER_DATA_URI => Self::UserData,
            _ => Self::Custom(value),
        }
    }
}

impl From<ClaimType> for String {
    fn from(value: ClaimType) -> Self {
        match value {
            ClaimType::Custom(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

/// A single claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: ClaimType,
    pub value: String,
    /// `None` for claims from the authentication token itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

impl Claim {
    pub fn new(claim_type: ClaimType, value: impl Into<String>) -> Self {
        Self {
            claim_type,
            value: value.into(),
            issuer: None,
        }
    }

    pub fn issued_by(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    fn is_issued_by(&self, issuer: &str) -> bool {
        self.issuer.as_deref() == Some(issuer)
    }
}

/// A labelled group of claims within a principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsIdentity {
    pub label: Option<String>,
    pub claims: Vec<Claim>,
}

impl ClaimsIdentity {
    pub fn new(claims: Vec<Claim>) -> Self {
        Self {
            label: None,
            claims,
        }
    }

    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            claims: Vec::new(),
        }
    }

    pub fn add_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    /// Remove every claim issued by `issuer`.
    pub fn remove_claims_issued_by(&mut self, issuer: &str) {
        self.claims.retain(|c| !c.is_issued_by(issuer));
    }
}

/// An authenticated caller: one or more identities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsPrincipal {
    pub identities: Vec<ClaimsIdentity>,
}

impl ClaimsPrincipal {
    pub fn new(identities: Vec<ClaimsIdentity>) -> Self {
        Self { identities }
    }

    /// A principal whose only claim is the object id, as after token
    /// validation and before augmentation.
    pub fn with_oid(oid: Uuid) -> Self {
        Self::new(vec![ClaimsIdentity::new(vec![Claim::new(
            ClaimType::ObjectId,
            oid.to_string(),
        )])])
    }

    pub fn add_identity(&mut self, identity: ClaimsIdentity) {
        self.identities.push(identity);
    }

    /// The identity labelled `label`, if any.
    pub fn identity(&self, label: &str) -> Option<&ClaimsIdentity> {
        self.identities
            .iter()
            .find(|i| i.label.as_deref() == Some(label))
    }

    /// Find-or-create the identity labelled `label`.
    pub fn identity_mut_or_insert(&mut self, label: &str) -> &mut ClaimsIdentity {
        let position = self
            .identities
            .iter()
            .position(|i| i.label.as_deref() == Some(label));
        let index = match position {
            Some(index) => index,
            None => {
                self.identities.push(ClaimsIdentity::labelled(label));
                self.identities.len() - 1
            }
        };
        &mut self.identities[index]
    }

    /// All claims across all identities.
    pub fn claims(&self) -> impl Iterator<Item = &Claim> {
        self.identities.iter().flat_map(|i| i.claims.iter())
    }

    /// The external user identifier, if present and well formed.
    #[must_use]
    pub fn oid(&self) -> Option<Uuid> {
        self.claims()
            .filter(|c| c.claim_type == ClaimType::ObjectId)
            .find_map(|c| Uuid::parse_str(c.value.trim()).ok())
    }

    /// Returns `true` if the principal has a specific role, whoever issued
    /// it. Roles carried in by the token count as well.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.claims()
            .any(|c| c.claim_type == ClaimType::Role && c.value == role)
    }

    /// Returns `true` if `issuer` granted the role.
    #[must_use]
    pub fn has_role_issued_by(&self, role: &str, issuer: &str) -> bool {
        self.claims().any(|c| {
            c.claim_type == ClaimType::Role && c.value == role && c.is_issued_by(issuer)
        })
    }

    /// Returns `true` if the principal has any of the specified roles.
    #[must_use]
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }

    /// User-data claim values issued by `issuer` and starting with `prefix`,
    /// with the prefix removed.
    pub fn user_data_issued_by<'a>(
        &'a self,
        prefix: &'a str,
        issuer: &'a str,
    ) -> impl Iterator<Item = &'a str> {
        self.claims()
            .filter(move |c| c.claim_type == ClaimType::UserData && c.is_issued_by(issuer))
            .filter_map(move |c| c.value.strip_prefix(prefix))
    }

    /// Returns `true` if augmentation under `issuer` recorded that `oid` is
    /// a known person. The same claim arriving in the token is ignored.
    #[must_use]
    pub fn person_exists_locally(&self, oid: Uuid, issuer: &str) -> bool {
        let oid = oid.to_string();
        self.user_data_issued_by(PERSON_EXISTS_PREFIX, issuer)
            .any(|value| value == oid)
    }
}
