//! The claims produced by one augmentation run.

use std::collections::BTreeSet;

use super::model::{Claim, ClaimType, ClaimsPrincipal};

/// An immutable set of `(claim type, value)` pairs.
///
/// Built once per augmentation run and applied to the principal in one
/// step, so a run that fails or is cancelled leaves the principal as it
/// was. Duplicate pairs collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimSet {
    claims: BTreeSet<(ClaimType, String)>,
}

impl ClaimSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    #[must_use]
    pub fn contains(&self, claim_type: &ClaimType, value: &str) -> bool {
        self.claims
            .iter()
            .any(|(t, v)| t == claim_type && v == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClaimType, &str)> {
        self.claims.iter().map(|(t, v)| (t, v.as_str()))
    }

    /// Values of the claims of one type.
    pub fn values(&self, claim_type: &ClaimType) -> impl Iterator<Item = &str> {
        self.claims
            .iter()
            .filter(move |(t, _)| t == claim_type)
            .map(|(_, v)| v.as_str())
    }

    /// Replace everything `issuer` previously added to `principal` with this set.
    ///
    /// The claims go into the identity labelled `issuer`, which is created
    /// if the principal has none. Claims from other issuers are kept.
    pub fn apply(&self, principal: &mut ClaimsPrincipal, issuer: &str) {
        let identity = principal.identity_mut_or_insert(issuer);
        identity.remove_claims_issued_by(issuer);
        for (claim_type, value) in &self.claims {
            identity.add_claim(Claim::new(claim_type.clone(), value.clone()).issued_by(issuer));
        }
    }
}

impl FromIterator<(ClaimType, String)> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = (ClaimType, String)>>(iter: I) -> Self {
        Self {
            claims: iter.into_iter().collect(),
        }
    }
}
