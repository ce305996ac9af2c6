//! Account provisioning.
//!
//! Every account gets a TOTP secret at creation time, whether or not MFA is
//! enabled, so enabling MFA later is a single flag flip.

use anyhow::anyhow;
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::{password, totp, AuthError},
    store::{models::now_unix, Account, AccountRole, AccountStore},
};

/// Normalize an email for lookup/uniqueness checks.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
}

impl AccountService {
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Create an account: uniqueness check, strength check, hash, secret
    /// generation, persist.
    ///
    /// # Errors
    /// `Validation` for a taken email, `Policy` for a weak password,
    /// `DependencyUnavailable` if the store is unreachable.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_plain: &str,
        role: AccountRole,
    ) -> Result<Account, AuthError> {
        let email = normalize_email(email);
        if !valid_email(&email) {
            return Err(AuthError::Validation("invalid email address".to_string()));
        }

        // Fail fast on a taken email before doing any hashing work.
        let existing = self
            .store
            .find_by_email(&email)
            .await
            .map_err(|err| AuthError::DependencyUnavailable(anyhow!(err)))?;
        if existing.is_some() {
            return Err(AuthError::Validation("email already registered".to_string()));
        }

        password::check_strength(password_plain)?;
        let password_hash = password::hash(password_plain)?;
        let mfa_secret = totp::generate_secret()?;

        let account = Account {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email,
            password_hash,
            role,
            mfa_enabled: false,
            mfa_secret,
            created_at_unix: now_unix(),
        };

        self.store
            .create(account)
            .await
            .map_err(|err| AuthError::DependencyUnavailable(anyhow!(err)))
    }

    /// # Errors
    /// `DependencyUnavailable` if the store is unreachable.
    pub async fn list(&self) -> Result<Vec<Account>, AuthError> {
        self.store
            .list()
            .await
            .map_err(|err| AuthError::DependencyUnavailable(anyhow!(err)))
    }
}
