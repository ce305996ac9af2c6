//! Login orchestration: password check, optional MFA challenge, token
//! issuance.
//!
//! A login either completes immediately (MFA disabled) or parks behind a
//! single-use challenge stored in the cache with a bounded lifetime. The
//! follow-up MFA submission carries no password; possession of a live
//! challenge id is the proof that the password step already passed.

use anyhow::anyhow;
use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    cache::Cache,
    store::{Account, AccountStore},
};

use super::{
    error::AuthError,
    password,
    tokens::{TokenPair, TokenService},
    totp,
};

/// Cache key namespace for pending login challenges.
const CHALLENGE_NAMESPACE: &str = "mfa-challenge:";

const MFA_CODE_DIGITS: usize = 6;

/// Result of the password step.
#[derive(Debug)]
pub enum LoginOutcome {
    /// MFA disabled: tokens issued directly.
    Authenticated(TokenPair),
    /// MFA enabled: no tokens yet, finish with [`LoginService::verify_mfa`].
    MfaRequired { challenge_id: String },
}

#[derive(Clone)]
pub struct LoginService {
    accounts: Arc<dyn AccountStore>,
    cache: Arc<dyn Cache>,
    tokens: TokenService,
    challenge_ttl: Duration,
    issuer: String,
}

impl LoginService {
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        cache: Arc<dyn Cache>,
        tokens: TokenService,
        challenge_ttl: Duration,
        issuer: String,
    ) -> Self {
        Self {
            accounts,
            cache,
            tokens,
            challenge_ttl,
            issuer,
        }
    }

    /// Verify email + password, returning the account on success.
    ///
    /// # Errors
    /// A missing account and a wrong password both yield
    /// `InvalidCredentials`, so callers cannot enumerate accounts.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let account = self
            .accounts
            .find_by_email(email)
            .await
            .map_err(|err| AuthError::DependencyUnavailable(anyhow!(err)))?
            .ok_or(AuthError::InvalidCredentials)?;

        password::verify(&account.password_hash, password)?;
        Ok(account)
    }

    /// Run the password step of a login.
    ///
    /// # Errors
    /// `InvalidCredentials` on a failed password check;
    /// `DependencyUnavailable` if the challenge cannot be parked or tokens
    /// cannot be issued.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let account = self.authenticate(email, password).await?;

        if account.mfa_enabled {
            let challenge_id = Uuid::new_v4().to_string();
            self.cache
                .set(
                    &challenge_key(&challenge_id),
                    &account.email,
                    self.challenge_ttl,
                )
                .await
                .map_err(|err| AuthError::DependencyUnavailable(anyhow!(err)))?;
            debug!(email, "login parked behind mfa challenge");
            return Ok(LoginOutcome::MfaRequired { challenge_id });
        }

        let pair = self.tokens.issue(&account).await?;
        Ok(LoginOutcome::Authenticated(pair))
    }

    /// Finish a challenged login with a 6-digit code.
    ///
    /// The challenge is consumed atomically after the code verifies; when
    /// two submissions race, at most one reaches token issuance.
    ///
    /// # Errors
    /// `ChallengeExpiredOrInvalid` if the challenge is gone (expired, never
    /// issued, or consumed by a concurrent submission); `InvalidCode` if the
    /// code does not match any accepted window.
    pub async fn verify_mfa(&self, challenge_id: &str, code: &str) -> Result<TokenPair, AuthError> {
        let code = parse_code(code)?;
        let key = challenge_key(challenge_id);

        let email = self
            .cache
            .get(&key)
            .await
            .map_err(|err| AuthError::DependencyUnavailable(anyhow!(err)))?
            .ok_or(AuthError::ChallengeExpiredOrInvalid)?;

        let account = self
            .accounts
            .find_by_email(&email)
            .await
            .map_err(|err| AuthError::DependencyUnavailable(anyhow!(err)))?
            .ok_or(AuthError::ChallengeExpiredOrInvalid)?;

        if !totp::verify(&account.mfa_secret, code, SystemTime::now())? {
            return Err(AuthError::InvalidCode);
        }

        // Single-use: removing the challenge is the commit point.
        self.cache
            .take(&key)
            .await
            .map_err(|err| AuthError::DependencyUnavailable(anyhow!(err)))?
            .ok_or(AuthError::ChallengeExpiredOrInvalid)?;

        self.tokens.issue(&account).await
    }

    /// Return the otpauth:// provisioning URI for an account, gated on a
    /// fresh password check.
    ///
    /// # Errors
    /// `InvalidCredentials` on a failed password check.
    pub async fn totp_uri(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let account = self.authenticate(email, password).await?;
        Ok(totp::provisioning_uri(
            &self.issuer,
            &account.email,
            &account.mfa_secret,
        ))
    }

    /// Confirm enrollment: verify a first code against the stored secret and
    /// flip the MFA flag.
    ///
    /// # Errors
    /// `InvalidCredentials` / `InvalidCode` on failed checks.
    pub async fn confirm_mfa(
        &self,
        email: &str,
        password: &str,
        code: &str,
    ) -> Result<(), AuthError> {
        let mut account = self.authenticate(email, password).await?;
        let code = parse_code(code)?;

        if !totp::verify(&account.mfa_secret, code, SystemTime::now())? {
            return Err(AuthError::InvalidCode);
        }

        account.mfa_enabled = true;
        self.accounts
            .update(&account)
            .await
            .map_err(|err| AuthError::DependencyUnavailable(anyhow!(err)))?;
        Ok(())
    }
}

fn challenge_key(challenge_id: &str) -> String {
    format!("{CHALLENGE_NAMESPACE}{challenge_id}")
}

// Codes arrive as strings so leading zeros survive transport.
fn parse_code(code: &str) -> Result<u32, AuthError> {
    if code.len() != MFA_CODE_DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AuthError::Validation(
            "code must be exactly 6 digits".to_string(),
        ));
    }
    code.parse()
        .map_err(|_| AuthError::Validation("code must be exactly 6 digits".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::MemoryCache,
        store::{AccountRole, MemoryStore},
    };
    use secrecy::SecretString;

    struct Fixture {
        login: LoginService,
        cache: Arc<MemoryCache>,
        store: Arc<MemoryStore>,
        secret: String,
    }

    async fn fixture(mfa_enabled: bool) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let secret = totp::generate_secret().unwrap();

        store
            .create(Account {
                id: Uuid::new_v4(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: password::hash("Str0ng!Pw").unwrap(),
                role: AccountRole::Admin,
                mfa_enabled,
                mfa_secret: secret.clone(),
                created_at_unix: 0,
            })
            .await
            .unwrap();

        let tokens = TokenService::new(
            store.clone(),
            cache.clone(),
            SecretString::from("unit-test-signing-key"),
            Duration::from_secs(900),
            Duration::from_secs(3600),
        );
        let login = LoginService::new(
            store.clone(),
            cache.clone(),
            tokens,
            Duration::from_secs(3600),
            "dataforge".to_string(),
        );
        Fixture {
            login,
            cache,
            store,
            secret,
        }
    }

    fn current_code(secret: &str) -> String {
        format!("{:06}", totp::derive_code(secret, SystemTime::now()).unwrap())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_account_are_indistinguishable() {
        let f = fixture(false).await;

        let wrong_password = f
            .login
            .login("alice@example.com", "WrongPw1!")
            .await
            .unwrap_err();
        let unknown_account = f.login.login("nobody@example.com", "Str0ng!Pw").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_account, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn mfa_disabled_login_issues_tokens_without_a_challenge() {
        let f = fixture(false).await;

        match f.login.login("alice@example.com", "Str0ng!Pw").await.unwrap() {
            LoginOutcome::Authenticated(pair) => {
                assert!(!pair.access_token.is_empty());
                assert!(!pair.refresh_token.is_empty());
            }
            LoginOutcome::MfaRequired { .. } => panic!("unexpected mfa challenge"),
        }
    }

    #[tokio::test]
    async fn mfa_enabled_login_parks_behind_a_challenge() {
        let f = fixture(true).await;

        let challenge_id = match f.login.login("alice@example.com", "Str0ng!Pw").await.unwrap() {
            LoginOutcome::MfaRequired { challenge_id } => challenge_id,
            LoginOutcome::Authenticated(_) => panic!("expected mfa challenge"),
        };

        // Challenge maps to the account identity in the cache.
        let stored = f
            .cache
            .get(&challenge_key(&challenge_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, "alice@example.com");

        let pair = f
            .login
            .verify_mfa(&challenge_id, &current_code(&f.secret))
            .await
            .unwrap();
        assert!(!pair.access_token.is_empty());

        // The challenge was consumed; replay fails.
        let replay = f
            .login
            .verify_mfa(&challenge_id, &current_code(&f.secret))
            .await
            .unwrap_err();
        assert!(matches!(replay, AuthError::ChallengeExpiredOrInvalid));
    }

    #[tokio::test]
    async fn wrong_code_leaves_the_challenge_alive() {
        let f = fixture(true).await;

        let challenge_id = match f.login.login("alice@example.com", "Str0ng!Pw").await.unwrap() {
            LoginOutcome::MfaRequired { challenge_id } => challenge_id,
            LoginOutcome::Authenticated(_) => panic!("expected mfa challenge"),
        };

        let good = current_code(&f.secret);
        let bad = format!("{:06}", (good.parse::<u32>().unwrap() + 1) % 1_000_000);

        let err = f.login.verify_mfa(&challenge_id, &bad).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCode));

        // A correct retry still works.
        f.login.verify_mfa(&challenge_id, &good).await.unwrap();
    }

    #[tokio::test]
    async fn stale_challenge_is_rejected() {
        let f = fixture(true).await;
        let err = f
            .login
            .verify_mfa("00000000-0000-0000-0000-000000000000", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ChallengeExpiredOrInvalid));
    }

    #[tokio::test]
    async fn malformed_code_is_a_validation_error() {
        let f = fixture(true).await;
        for bad in ["", "12345", "1234567", "12345a"] {
            let err = f.login.verify_mfa("whatever", bad).await.unwrap_err();
            assert!(matches!(err, AuthError::Validation(_)), "code {bad:?}");
        }
    }

    #[tokio::test]
    async fn confirm_mfa_flips_the_flag() {
        let f = fixture(false).await;

        f.login
            .confirm_mfa("alice@example.com", "Str0ng!Pw", &current_code(&f.secret))
            .await
            .unwrap();

        let account = f
            .store
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(account.mfa_enabled);
    }

    #[tokio::test]
    async fn totp_uri_requires_the_password() {
        let f = fixture(false).await;

        let uri = f
            .login
            .totp_uri("alice@example.com", "Str0ng!Pw")
            .await
            .unwrap();
        assert!(uri.starts_with("otpauth://totp/dataforge:alice@example.com?"));
        assert!(uri.contains(&f.secret));

        assert!(matches!(
            f.login.totp_uri("alice@example.com", "WrongPw1!").await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
