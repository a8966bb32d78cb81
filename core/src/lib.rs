//! globus-oidc-core: Platform-agnostic Globus OIDC backend logic
//!
//! Selects the JWKS key for Globus ID tokens (whose published key metadata
//! declares the wrong algorithm) and maps verified claims to local accounts
//! under an institutional identity policy. It depends only on abstract
//! platform traits (HttpClient, Environment, AccountStore, ProfileStore,
//! DiagnosticSink) and never verifies signatures itself.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod identity;
pub mod oidc;
pub mod platform;

#[cfg(test)]
pub mod test_support;
