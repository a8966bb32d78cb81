//! Configuration loaded from the platform environment

use crate::error::{ApiError, Result};
use crate::identity::IdentityPolicy;
use crate::platform::Environment;

/// Default JWKS fetch timeout in seconds
pub const DEFAULT_JWKS_TIMEOUT_SECS: u64 = 10;

/// Default institutional suffix required in strict mode
pub const DEFAULT_INSTITUTION_SUFFIX: &str = "@mit.edu";

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// JWKS endpoint of the identity provider (e.g., "https://auth.globus.org/jwk.json")
    pub jwks_endpoint: String,
    /// Timeout applied to every JWKS fetch
    pub jwks_timeout_secs: u64,
    /// Claims validation and username derivation policy
    pub identity_policy: IdentityPolicy,
    /// Optional path of the append-only diagnostic log
    pub debug_log_path: Option<String>,
}

impl Config {
    /// Load configuration from platform environment
    pub fn from_env(env: &dyn Environment) -> Result<Self> {
        let jwks_endpoint = env
            .get_var("OIDC_OP_JWKS_ENDPOINT")
            .map_err(|_| ApiError::internal("OIDC_OP_JWKS_ENDPOINT not configured"))?;
        validate_endpoint_url(&jwks_endpoint)?;

        let jwks_timeout_secs = match env.get_var("OIDC_JWKS_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ApiError::internal(format!("OIDC_JWKS_TIMEOUT_SECS must be a number, got '{}'", raw))
            })?,
            Err(_) => DEFAULT_JWKS_TIMEOUT_SECS,
        };

        let suffix = env
            .get_var("OIDC_INSTITUTION_SUFFIX")
            .unwrap_or_else(|_| DEFAULT_INSTITUTION_SUFFIX.to_string());

        let identity_policy = match env.get_var("OIDC_IDENTITY_MODE").as_deref() {
            Ok("strict") | Err(_) => IdentityPolicy::strict(suffix)?,
            Ok("loose") => IdentityPolicy::Loose,
            Ok(other) => {
                return Err(ApiError::internal(format!(
                    "OIDC_IDENTITY_MODE must be 'strict' or 'loose', got '{}'",
                    other
                )))
            }
        };

        let debug_log_path = env.get_var("OIDC_DEBUG_LOG").ok().filter(|p| !p.is_empty());

        Ok(Self {
            jwks_endpoint,
            jwks_timeout_secs,
            identity_policy,
            debug_log_path,
        })
    }
}

/// Validate the JWKS endpoint: HTTPS only, except for local development hosts
fn validate_endpoint_url(endpoint: &str) -> Result<()> {
    let url = url::Url::parse(endpoint)
        .map_err(|_| ApiError::internal(format!("invalid JWKS endpoint URL: {}", endpoint)))?;

    let is_localhost = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1") | Some("[::1]"));
    if url.scheme() != "https" && !is_localhost {
        return Err(ApiError::internal("JWKS endpoint must use HTTPS"));
    }

    if !url.username().is_empty() || url.password().is_some() {
        return Err(ApiError::internal("JWKS endpoint URL must not have userinfo"));
    }

    Ok(())
}
