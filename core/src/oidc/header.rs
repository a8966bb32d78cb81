//! Unverified token header decoding

use jsonwebtoken::decode_header;

use crate::error::{ApiError, Result};

/// Key-selection relevant parts of a JWT header, read without verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    /// Key ID (optional)
    pub kid: Option<String>,
    /// Declared signing algorithm label (e.g., "RS512")
    pub alg: String,
}

/// Decode a token header without checking its signature
pub fn decode_token_header(token: &str) -> Result<TokenHeader> {
    let header = decode_header(token)
        .map_err(|e| ApiError::key_selection(format!("could not decode ID token header: {}", e)))?;

    let alg = serde_json::to_value(header.alg)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| ApiError::key_selection("could not read ID token algorithm"))?;

    Ok(TokenHeader { kid: header.kid, alg })
}
