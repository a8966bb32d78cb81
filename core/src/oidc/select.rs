//! Key selection for ID token verification
//!
//! Globus signs ID tokens with RS512 while its JWKS advertises the same key as
//! RS256. A standard client refuses that pairing, so a `kid` match is accepted
//! here without comparing algorithms. The bypass applies to the `kid` match
//! only; the verifier still checks the signature with the token's algorithm.

use tracing::{debug, error};

use super::header::{decode_token_header, TokenHeader};
use super::jwks::{fetch_jwks, Jwk, JwkSet};
use crate::diagnostics::DiagnosticSink;
use crate::error::{ApiError, Result};
use crate::platform::HttpClient;

/// Which rule picked the key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatch {
    /// Token `kid` equals the key's `kid`; key `alg` is ignored
    Kid,
    /// The set holds exactly one key
    SingleKey,
    /// First key whose `alg` equals the token's `alg`
    Algorithm,
}

/// Fetch the JWKS and return the key to verify `token` with
pub async fn select_key(
    token: &str,
    jwks_uri: &str,
    http: &dyn HttpClient,
    sink: &dyn DiagnosticSink,
) -> Result<Jwk> {
    let header = decode_token_header(token).inspect_err(|e| {
        error!(error = %e, "could not decode token header");
        sink.record(&format!("CRITICAL: Could not decode token header: {}", e));
    })?;

    debug!(kid = ?header.kid, alg = %header.alg, "token header decoded");
    sink.record(&format!(
        "Token header - KID: {}, Algorithm: {}",
        header.kid.as_deref().unwrap_or("None"),
        header.alg
    ));

    let jwks = fetch_jwks(jwks_uri, http).await.inspect_err(|e| {
        error!(error = %e, jwks_uri, "JWKS fetch failed");
        sink.record(&format!("CRITICAL: {}", e));
    })?;

    let (key, matched) = choose_key(&header, &jwks).inspect_err(|_| {
        error!(kid = ?header.kid, available = ?jwks.kids(), "no matching JWKS key");
        sink.record(&format!(
            "CRITICAL: No matching key found. Token KID: {}, Available keys: {:?}",
            header.kid.as_deref().unwrap_or("None"),
            jwks.kids()
        ));
    })?;

    match matched {
        KeyMatch::Kid => sink.record(&format!(
            "Found matching key by KID: {} (key claims {})",
            key.kid.as_deref().unwrap_or_default(),
            key.alg.as_deref().unwrap_or("None")
        )),
        KeyMatch::SingleKey => sink.record("Using single available key (no KID match)"),
        KeyMatch::Algorithm => sink.record(&format!("Using key matched by algorithm: {}", header.alg)),
    }
    debug!(kid = ?key.kid, key_alg = ?key.alg, rule = ?matched, "selected JWKS key");

    Ok(key.clone())
}

/// Pick a key from an already fetched set
///
/// Rules, first match wins: `kid` match (algorithm not compared), the only
/// key in the set, first key with the token's algorithm. An empty token `kid`
/// counts as absent.
pub fn choose_key<'k>(header: &TokenHeader, jwks: &'k JwkSet) -> Result<(&'k Jwk, KeyMatch)> {
    if let Some(kid) = header.kid.as_deref().filter(|kid| !kid.is_empty()) {
        if let Some(key) = jwks.keys.iter().find(|k| k.kid.as_deref() == Some(kid)) {
            return Ok((key, KeyMatch::Kid));
        }
    }

    if let [only] = jwks.keys.as_slice() {
        return Ok((only, KeyMatch::SingleKey));
    }

    jwks.keys
        .iter()
        .find(|k| k.alg.as_deref() == Some(header.alg.as_str()))
        .map(|key| (key, KeyMatch::Algorithm))
        .ok_or_else(|| ApiError::key_selection("could not find matching JWKS key for ID token"))
}
