//! Platform abstraction traits
//!
//! These traits define the boundary between the platform-agnostic key
//! selection and identity logic and the native adapter (reqwest, process
//! environment). Account storage lives in [`crate::identity::store`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// HTTP client for outbound requests (JWKS endpoint)
///
/// Implementations own their transport timeout and report it as
/// [`crate::error::ApiError::UpstreamTimeout`].
#[async_trait(?Send)]
pub trait HttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse>;
}

/// HTTP response from an outbound request
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Environment access
pub trait Environment {
    fn get_var(&self, name: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success_covers_2xx_only() {
        let ok = |status| HttpResponse { status, body: Vec::new() }.is_success();
        assert!(ok(200));
        assert!(ok(204));
        assert!(!ok(199));
        assert!(!ok(301));
        assert!(!ok(503));
    }
}
