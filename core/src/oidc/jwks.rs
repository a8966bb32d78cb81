//! JWKS (JSON Web Key Set) handling
//!
//! Fetches the JWKS on every call. Keys are kept as pass-through JSON so a
//! mislabelled or unknown `alg` never fails parsing.

use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};
use crate::platform::HttpClient;

/// A single published key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Algorithm the provider claims the key is used with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Key material (`kty`, `n`, `e`, `use`, ...), not interpreted here
    #[serde(flatten)]
    pub material: Map<String, Value>,
}

impl Jwk {
    /// Build verifier key material from this JWK
    pub fn decoding_key(&self) -> Result<DecodingKey> {
        let value = serde_json::to_value(self)
            .map_err(|e| ApiError::key_selection(format!("unserializable JWK: {}", e)))?;
        let jwk: jsonwebtoken::jwk::Jwk = serde_json::from_value(value)
            .map_err(|e| ApiError::key_selection(format!("unsupported JWK: {}", e)))?;

        DecodingKey::from_jwk(&jwk).map_err(|e| ApiError::key_selection(format!("invalid JWK: {}", e)))
    }
}

/// Ordered set of keys as published by the identity provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JwkSet {
    #[serde(default)]
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Key IDs in publication order, for diagnostics
    pub fn kids(&self) -> Vec<Option<&str>> {
        self.keys.iter().map(|k| k.kid.as_deref()).collect()
    }
}

/// Fetch JWKS from a URI
///
/// Every failure (transport, timeout, non-2xx, invalid JSON, no keys) is
/// reported as a key selection error.
pub async fn fetch_jwks(jwks_uri: &str, http: &dyn HttpClient) -> Result<JwkSet> {
    let response = http
        .get(
            jwks_uri,
            &[
                ("Accept", "application/json"),
                ("User-Agent", "globus-oidc"),
            ],
        )
        .await
        .map_err(|e| ApiError::key_selection(format!("could not fetch JWKS from identity provider: {}", e)))?;

    if !response.is_success() {
        return Err(ApiError::key_selection(format!(
            "could not fetch JWKS from identity provider: HTTP {}",
            response.status
        )));
    }

    let jwks: JwkSet = response
        .json()
        .map_err(|e| ApiError::key_selection(format!("invalid JWKS response from identity provider: {}", e)))?;

    if jwks.keys.is_empty() {
        return Err(ApiError::key_selection("JWKS contains no keys"));
    }

    Ok(jwks)
}
