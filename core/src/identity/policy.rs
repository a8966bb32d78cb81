//! Identity validation and username derivation

use super::claims::Claims;
use crate::error::{ApiError, Result};

/// How claims are validated and turned into a username
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityPolicy {
    /// Require a linked identity whose username ends with `suffix` (e.g.
    /// "@mit.edu") and use its stem as the local username
    Strict { suffix: String },
    /// Accept any identity; username is `preferred_username` or the email
    Loose,
}

/// Identifier a username is derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Full identifier, e.g. "cnh@mit.edu"
    pub value: String,
    /// Taken from an institutional linked identity
    pub institutional: bool,
}

impl IdentityPolicy {
    /// Strict policy; the suffix must be an `@domain` marker
    pub fn strict(suffix: impl Into<String>) -> Result<Self> {
        let suffix = suffix.into();
        if !suffix.starts_with('@') || suffix.len() < 2 {
            return Err(ApiError::internal(format!(
                "institution suffix must look like '@domain', got '{}'",
                suffix
            )));
        }
        Ok(Self::Strict { suffix })
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict { .. })
    }

    /// First linked identity carrying the institutional suffix
    pub fn institutional_identity<'c>(&self, claims: &'c Claims) -> Option<&'c str> {
        let Self::Strict { suffix } = self else {
            return None;
        };

        claims
            .linked_identities()
            .iter()
            .filter_map(|identity| identity.username())
            .find(|username| username.ends_with(suffix.as_str()))
    }

    /// Whether the claims are acceptable at all
    pub fn validate_identity(&self, claims: &Claims) -> bool {
        match self {
            Self::Strict { .. } => self.institutional_identity(claims).is_some(),
            Self::Loose => true,
        }
    }

    /// The identifier the username comes from (the EPPN in strict mode)
    ///
    /// Strict mode falls back to `preferred_username`, then `username`, when no
    /// institutional identity is linked. Those fallbacks are not institutional
    /// and may be any string.
    pub fn extract_principal(&self, claims: &Claims) -> Option<Principal> {
        match self {
            Self::Strict { .. } => {
                if let Some(eppn) = self.institutional_identity(claims) {
                    return Some(Principal {
                        value: eppn.to_string(),
                        institutional: true,
                    });
                }

                claims
                    .preferred_username()
                    .or_else(|| claims.username())
                    .map(|value| Principal {
                        value: value.to_string(),
                        institutional: false,
                    })
            }
            Self::Loose => claims
                .preferred_username()
                .or_else(|| claims.email())
                .map(|value| Principal {
                    value: value.to_string(),
                    institutional: false,
                }),
        }
    }

    /// Local username for the claims
    ///
    /// A fallback value is returned as-is, even when it happens to end with
    /// the suffix.
    pub fn derive_username(&self, claims: &Claims) -> Option<String> {
        self.extract_principal(claims).map(|principal| principal.username())
    }
}

impl Principal {
    /// Username derived from this identifier
    ///
    /// Only an institutional EPPN is stripped to its stem; fallbacks are kept
    /// verbatim.
    pub fn username(&self) -> String {
        if self.institutional {
            username_from_eppn(&self.value).to_string()
        } else {
            self.value.clone()
        }
    }
}

/// Username stem of an EPPN: everything before the first `@`
pub fn username_from_eppn(eppn: &str) -> &str {
    eppn.split_once('@').map_or(eppn, |(stem, _)| stem)
}
