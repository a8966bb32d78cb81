//! Claims to local account resolution

use tracing::{debug, info, warn};

use super::claims::Claims;
use super::policy::{IdentityPolicy, Principal};
use super::store::{AccountFilter, AccountStore, LocalAccount, ProfileStore};
use crate::diagnostics::DiagnosticSink;
use crate::error::{ApiError, Result};

const INSTITUTION_REQUIRED: &str = "Authentication requires institutional credentials";

/// Maps verified claims to local accounts
pub struct IdentityMapper<'a> {
    policy: IdentityPolicy,
    accounts: &'a dyn AccountStore,
    profiles: Option<&'a dyn ProfileStore>,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> IdentityMapper<'a> {
    /// `profiles` is optional; without it no profile is ever touched
    pub fn new(
        policy: IdentityPolicy,
        accounts: &'a dyn AccountStore,
        profiles: Option<&'a dyn ProfileStore>,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            policy,
            accounts,
            profiles,
            sink,
        }
    }

    /// Check the institutional requirement (always true in loose mode)
    pub fn validate_identity(&self, claims: &Claims) -> bool {
        let IdentityPolicy::Strict { suffix } = &self.policy else {
            return true;
        };

        self.sink.record(&format!(
            "Searching for {} identity in {} identities",
            suffix,
            claims.linked_identities().len()
        ));

        match self.policy.institutional_identity(claims) {
            Some(eppn) => {
                self.sink.record(&format!("Institutional identity validated: {}", eppn));
                true
            }
            None => {
                warn!(suffix = %suffix, "no institutional identity in identity_set");
                self.sink.record(&format!("WARNING: No {} identity found in identity_set", suffix));
                false
            }
        }
    }

    /// Local username for the claims, if any can be derived
    pub fn derive_username(&self, claims: &Claims) -> Option<String> {
        self.policy.derive_username(claims)
    }

    /// Find or create the local account for a login
    pub async fn resolve_user(&self, claims: &Claims) -> Result<LocalAccount> {
        self.require_valid_identity(claims)?;
        let principal = self.require_principal(claims)?;
        let username = principal.username();

        match self.find_existing(&username, claims.email()).await? {
            Some(account) => self.refresh(account).await,
            None => self.create_account(claims, &principal, &username).await,
        }
    }

    /// Create a new account for first-time claims
    pub async fn create_user(&self, claims: &Claims) -> Result<LocalAccount> {
        self.require_valid_identity(claims)?;
        let principal = self.require_principal(claims)?;
        let username = principal.username();

        self.create_account(claims, &principal, &username).await
    }

    /// Refresh an existing account on a returning login
    ///
    /// Re-checks the identity, reactivates the account and ensures its profile.
    /// Name and email are left as they are.
    pub async fn update_user(&self, account: LocalAccount, claims: &Claims) -> Result<LocalAccount> {
        self.sink.record(&format!("Updating user: {}", account.username));

        if !self.validate_identity(claims) {
            self.sink.record(&format!(
                "CRITICAL: Rejecting update - no institutional identity for {}",
                account.username
            ));
            return Err(ApiError::authorization(INSTITUTION_REQUIRED));
        }

        self.refresh(account).await
    }

    /// Accounts matching the claims, without creating anything
    ///
    /// Invalid claims and unknown users both yield an empty list.
    pub async fn find_candidates(&self, claims: &Claims) -> Result<Vec<LocalAccount>> {
        if !self.validate_identity(claims) {
            self.sink.record("No institutional identity found - rejecting user lookup");
            return Ok(Vec::new());
        }

        let principal = self.policy.extract_principal(claims);
        if let Some(principal) = principal.as_ref().filter(|p| self.is_usable(p)) {
            let username = principal.username();
            let users = self.accounts.find(AccountFilter::Username(&username)).await?;
            if !users.is_empty() {
                self.sink.record(&format!("Found user by derived username: {}", username));
                return Ok(users);
            }
        }

        if let Some(email) = claims.email() {
            let users = self.accounts.find(AccountFilter::Email(email)).await?;
            if !users.is_empty() {
                self.sink.record(&format!("Found user by email: {}", email));
                return Ok(users);
            }
        }

        self.sink.record(&format!(
            "No existing user found for principal={}, email={}",
            principal.as_ref().map_or("None", |p| p.value.as_str()),
            claims.email().unwrap_or("None")
        ));
        Ok(Vec::new())
    }

    fn require_valid_identity(&self, claims: &Claims) -> Result<()> {
        if self.validate_identity(claims) {
            return Ok(());
        }

        self.sink.record("CRITICAL: Rejecting user - no institutional identity");
        Err(ApiError::authorization(INSTITUTION_REQUIRED))
    }

    fn require_principal(&self, claims: &Claims) -> Result<Principal> {
        match self.policy.extract_principal(claims) {
            Some(principal) if self.is_usable(&principal) => {
                if principal.institutional {
                    self.sink.record(&format!("Found institutional EPPN: {}", principal.value));
                } else {
                    self.sink.record(&format!(
                        "No institutional identity in identity_set, falling back to: {}",
                        principal.value
                    ));
                }
                Ok(principal)
            }
            other => {
                let shown = other.map_or_else(|| "None".to_string(), |p| p.value);
                warn!(principal = %shown, "claims carry no usable identity");
                self.sink.record(&format!("CRITICAL: Invalid EPPN: {}", shown));
                Err(ApiError::authentication_data("No valid identity found in claims"))
            }
        }
    }

    /// Strict mode needs an `@`-qualified identifier; loose mode any value
    fn is_usable(&self, principal: &Principal) -> bool {
        if self.policy.is_strict() {
            principal.value.contains('@')
        } else {
            !principal.value.is_empty()
        }
    }

    async fn find_existing(&self, username: &str, email: Option<&str>) -> Result<Option<LocalAccount>> {
        let mut users = self.accounts.find(AccountFilter::Username(username)).await?;
        if users.is_empty() {
            if let Some(email) = email {
                users = self.accounts.find(AccountFilter::Email(email)).await?;
            }
        }

        if users.len() > 1 {
            self.sink.record(&format!(
                "CRITICAL: {} accounts match username={} email={}",
                users.len(),
                username,
                email.unwrap_or("None")
            ));
            return Err(ApiError::authentication_data("Multiple accounts match these claims"));
        }

        Ok(users.pop())
    }

    async fn refresh(&self, mut account: LocalAccount) -> Result<LocalAccount> {
        if !account.is_active {
            info!(username = %account.username, "reactivating account");
            account.is_active = true;
            self.accounts.save(&account).await?;
        }

        self.ensure_profile(&account).await?;
        Ok(account)
    }

    async fn create_account(&self, claims: &Claims, principal: &Principal, username: &str) -> Result<LocalAccount> {
        let email = claims.email().unwrap_or(principal.value.as_str());

        self.sink.record(&format!(
            "Creating new user: username={}, email={}, eppn={}",
            username, email, principal.value
        ));

        let mut account = self.accounts.create(username, email).await.inspect_err(|e| {
            self.sink.record(&format!("CRITICAL: Failed to create user: {}", e));
        })?;

        // The store has no delete: if the save or profile write below fails, the
        // bare account stays and later logins take the update path, which never
        // fills in names.
        let (first_name, last_name) = claims.account_names();
        account.first_name = first_name;
        account.last_name = last_name;
        account.is_active = true;
        self.accounts.save(&account).await.inspect_err(|e| {
            self.sink.record(&format!("CRITICAL: Failed to create user: {}", e));
        })?;

        info!(id = account.id, username = %account.username, "account created");
        self.sink.record(&format!("User created: ID={}, username={}", account.id, account.username));

        self.ensure_profile(&account).await?;
        Ok(account)
    }

    async fn ensure_profile(&self, account: &LocalAccount) -> Result<()> {
        let Some(profiles) = self.profiles else {
            return Ok(());
        };

        let (_, created) = profiles.get_or_create(account).await?;
        debug!(account_id = account.id, created, "profile ensured");
        self.sink.record(&format!(
            "UserProfile {}",
            if created { "created" } else { "already exists" }
        ));
        Ok(())
    }
}
