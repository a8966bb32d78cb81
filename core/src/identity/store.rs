//! Account store interface
//!
//! The store owns uniqueness of usernames and atomicity of create; nothing in
//! this crate locks around it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Local user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalAccount {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
}

/// Portal profile attached one-to-one to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalProfile {
    pub account_id: u64,
}

/// Account lookup criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountFilter<'a> {
    Username(&'a str),
    Email(&'a str),
}

impl AccountFilter<'_> {
    pub fn matches(&self, account: &LocalAccount) -> bool {
        match self {
            Self::Username(username) => account.username == *username,
            Self::Email(email) => account.email == *email,
        }
    }
}

#[async_trait(?Send)]
pub trait AccountStore {
    /// All accounts matching the filter
    async fn find(&self, filter: AccountFilter<'_>) -> Result<Vec<LocalAccount>>;

    /// Insert a new account; fails if the username is taken
    async fn create(&self, username: &str, email: &str) -> Result<LocalAccount>;

    /// Persist changes to an existing account
    async fn save(&self, account: &LocalAccount) -> Result<()>;
}

#[async_trait(?Send)]
pub trait ProfileStore {
    /// Fetch the account's profile, creating it if missing; `true` when created
    async fn get_or_create(&self, account: &LocalAccount) -> Result<(LocalProfile, bool)>;
}
