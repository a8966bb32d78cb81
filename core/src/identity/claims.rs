//! Globus userinfo / ID token claims

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Claims asserted by the identity provider for one login attempt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Subject
    #[serde(default)]
    pub sub: Option<String>,

    /// All identities linked to the Globus account
    #[serde(default)]
    pub identity_set: Option<Vec<LinkedIdentity>>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub preferred_username: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub given_name: Option<String>,

    #[serde(default)]
    pub family_name: Option<String>,

    /// Full display name
    #[serde(default)]
    pub name: Option<String>,

    /// Additional claims
    #[serde(flatten)]
    pub custom_claims: HashMap<String, serde_json::Value>,
}

/// One entry of `identity_set`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkedIdentity {
    /// Username at the linked provider, an EPPN for institutional logins
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub sub: Option<String>,

    #[serde(flatten)]
    pub custom_claims: HashMap<String, serde_json::Value>,
}

impl Claims {
    pub fn linked_identities(&self) -> &[LinkedIdentity] {
        self.identity_set.as_deref().unwrap_or_default()
    }

    pub fn email(&self) -> Option<&str> {
        non_empty(&self.email)
    }

    pub fn preferred_username(&self) -> Option<&str> {
        non_empty(&self.preferred_username)
    }

    pub fn username(&self) -> Option<&str> {
        non_empty(&self.username)
    }

    /// First and last name for a new account
    ///
    /// Uses `given_name`/`family_name`; without a given name, `name` is split on
    /// its first space and the remainder (if any) becomes the last name.
    pub fn account_names(&self) -> (String, String) {
        let mut first = non_empty(&self.given_name).unwrap_or_default().to_string();
        let mut last = non_empty(&self.family_name).unwrap_or_default().to_string();

        if first.is_empty() {
            if let Some(name) = non_empty(&self.name) {
                match name.split_once(' ') {
                    Some((given, rest)) => {
                        first = given.to_string();
                        last = rest.to_string();
                    }
                    None => first = name.to_string(),
                }
            }
        }

        (first, last)
    }
}

impl LinkedIdentity {
    pub fn username(&self) -> Option<&str> {
        non_empty(&self.username)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
