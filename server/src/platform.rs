//! Native platform implementations
//!
//! Implements core platform traits using native Rust libraries:
//! - HttpClient: reqwest with a fixed request timeout
//! - Environment: std::env
//! - AccountStore / ProfileStore: in-process maps guarded by a mutex

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use globus_oidc_core::error::{ApiError, Result};
use globus_oidc_core::identity::{AccountFilter, AccountStore, LocalAccount, LocalProfile, ProfileStore};
use globus_oidc_core::platform::{Environment, HttpClient, HttpResponse};

/// reqwest-based HTTP client
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait(?Send)]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        let mut builder = self.client.get(url);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::UpstreamTimeout
    } else {
        ApiError::upstream_error(format!("HTTP GET failed: {}", e))
    }
}

/// Process environment
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get_var(&self, name: &str) -> Result<String> {
        std::env::var(name)
            .map_err(|_| ApiError::internal(format!("environment variable '{}' not set", name)))
    }
}

/// In-memory account store; username uniqueness is checked under the lock
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: Mutex<Vec<LocalAccount>>,
}

impl InMemoryAccountStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<LocalAccount>>> {
        self.accounts
            .lock()
            .map_err(|_| ApiError::store("account store lock poisoned"))
    }
}

#[async_trait(?Send)]
impl AccountStore for InMemoryAccountStore {
    async fn find(&self, filter: AccountFilter<'_>) -> Result<Vec<LocalAccount>> {
        let accounts = self.lock()?;
        Ok(accounts.iter().filter(|a| filter.matches(a)).cloned().collect())
    }

    async fn create(&self, username: &str, email: &str) -> Result<LocalAccount> {
        let mut accounts = self.lock()?;
        if accounts.iter().any(|a| a.username == username) {
            return Err(ApiError::store(format!("username '{}' already exists", username)));
        }

        let account = LocalAccount {
            id: accounts.len() as u64 + 1,
            username: username.to_string(),
            email: email.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
        };
        accounts.push(account.clone());
        Ok(account)
    }

    async fn save(&self, account: &LocalAccount) -> Result<()> {
        let mut accounts = self.lock()?;
        if accounts
            .iter()
            .any(|a| a.id != account.id && a.username == account.username)
        {
            return Err(ApiError::store(format!("username '{}' already exists", account.username)));
        }

        let slot = accounts
            .iter_mut()
            .find(|a| a.id == account.id)
            .ok_or_else(|| ApiError::store(format!("account {} does not exist", account.id)))?;
        *slot = account.clone();
        Ok(())
    }
}

/// In-memory profile store keyed by account ID
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<u64, LocalProfile>>,
}

#[async_trait(?Send)]
impl ProfileStore for InMemoryProfileStore {
    async fn get_or_create(&self, account: &LocalAccount) -> Result<(LocalProfile, bool)> {
        let mut profiles = self
            .profiles
            .lock()
            .map_err(|_| ApiError::store("profile store lock poisoned"))?;

        if let Some(profile) = profiles.get(&account.id) {
            return Ok((profile.clone(), false));
        }

        let profile = LocalProfile { account_id: account.id };
        profiles.insert(account.id, profile.clone());
        Ok((profile, true))
    }
}
