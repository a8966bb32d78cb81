//! OIDC key selection
//!
//! Fetches the identity provider's JWKS and picks the key an external verifier
//! should use for an ID token, tolerating Globus's mislabelled key algorithm.

mod header;
mod jwks;
mod select;

pub use header::{decode_token_header, TokenHeader};
pub use jwks::{fetch_jwks, Jwk, JwkSet};
pub use select::{choose_key, select_key, KeyMatch};
