//! Access/refresh token issuance, rotation, and revocation.
//!
//! Access tokens are stateless signed claim sets (HS256). Refresh tokens are
//! opaque random strings; only a SHA-256 hash ever reaches the cache, so a
//! cache compromise does not yield usable tokens. A refresh token is valid
//! for exactly one rotation: the cache `take` is the commit point, so two
//! concurrent refreshes of the same token produce at most one new pair.

use anyhow::{anyhow, Context};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use uuid::Uuid;

use crate::{
    cache::Cache,
    store::{Account, AccountStore, ScopedRole},
};

use super::error::AuthError;

/// Cache key namespace for refresh-token revocation records.
const REFRESH_TOKEN_NAMESPACE: &str = "refresh-token:";

const REFRESH_TOKEN_BYTES: usize = 32;

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub roles: Vec<ScopedRole>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues, rotates, and revokes the credential pair for an account.
#[derive(Clone)]
pub struct TokenService {
    accounts: Arc<dyn AccountStore>,
    cache: Arc<dyn Cache>,
    signing_key: SecretString,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        cache: Arc<dyn Cache>,
        signing_key: SecretString,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            accounts,
            cache,
            signing_key,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue a fresh access/refresh pair for an account.
    ///
    /// # Errors
    /// Fails with `DependencyUnavailable` if the revocation record cannot be
    /// written; no token is handed out without one.
    pub async fn issue(&self, account: &Account) -> Result<TokenPair, AuthError> {
        let access_token = self.sign_access_token(account)?;
        let refresh_token = generate_refresh_token()?;

        self.cache
            .set(&refresh_key(&refresh_token), &account.email, self.refresh_ttl)
            .await
            .map_err(|err| AuthError::DependencyUnavailable(anyhow!(err)))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new pair, invalidating the old token.
    ///
    /// # Errors
    /// `InvalidToken` if the token was never issued, already rotated,
    /// revoked, or expired.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let email = self
            .cache
            .take(&refresh_key(refresh_token))
            .await
            .map_err(|err| AuthError::DependencyUnavailable(anyhow!(err)))?
            .ok_or(AuthError::InvalidToken)?;

        // Re-read the account so rotated tokens pick up current roles and
        // MFA state instead of replaying claims from issuance time.
        let account = self
            .accounts
            .find_by_email(&email)
            .await
            .map_err(|err| AuthError::DependencyUnavailable(anyhow!(err)))?
            .ok_or(AuthError::InvalidToken)?;

        self.issue(&account).await
    }

    /// Drop the revocation record for a refresh token. Revoking a token that
    /// is already invalid is not an error.
    ///
    /// # Errors
    /// Fails only if the cache is unreachable.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.cache
            .delete(&refresh_key(refresh_token))
            .await
            .map_err(|err| AuthError::DependencyUnavailable(anyhow!(err)))
    }

    /// Validate an access token's signature and expiry, returning its claims.
    ///
    /// # Errors
    /// `InvalidToken` for any signature, shape, or expiry failure.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let decoded = decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.signing_key.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;
        Ok(decoded.claims)
    }

    fn sign_access_token(&self, account: &Account) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("clock before unix epoch")?
            .as_secs() as i64;

        let claims = AccessClaims {
            sub: account.id,
            email: account.email.clone(),
            roles: vec![ScopedRole::org(account.role)],
            iat: now,
            exp: now + self.access_ttl.as_secs() as i64,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.signing_key.expose_secret().as_bytes()),
        )
        .context("failed to sign access token")?;
        Ok(token)
    }
}

fn generate_refresh_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate refresh token")?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

// The cache key is derived from the token, never the token itself.
fn refresh_key(refresh_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(refresh_token.as_bytes());
    let digest = hasher.finalize();
    format!("{REFRESH_TOKEN_NAMESPACE}{}", URL_SAFE_NO_PAD.encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::MemoryCache,
        store::{AccountRole, MemoryStore},
    };

    fn service(store: Arc<MemoryStore>) -> TokenService {
        TokenService::new(
            store,
            Arc::new(MemoryCache::new()),
            SecretString::from("unit-test-signing-key"),
            Duration::from_secs(900),
            Duration::from_secs(3600),
        )
    }

    async fn seeded_account(store: &MemoryStore) -> Account {
        let account = Account {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$2b$12$hash".to_string(),
            role: AccountRole::Admin,
            mfa_enabled: false,
            mfa_secret: "SECRET".to_string(),
            created_at_unix: 0,
        };
        store.create(account.clone()).await.unwrap()
    }

    #[tokio::test]
    async fn issued_access_token_verifies_with_expected_claims() {
        let store = Arc::new(MemoryStore::new());
        let account = seeded_account(&store).await;
        let tokens = service(store);

        let pair = tokens.issue(&account).await.unwrap();
        let claims = tokens.verify_access_token(&pair.access_token).unwrap();

        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.roles, vec![ScopedRole::org(AccountRole::Admin)]);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn tampered_access_token_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let account = seeded_account(&store).await;
        let tokens = service(store);

        let pair = tokens.issue(&account).await.unwrap();
        let mut tampered = pair.access_token;
        tampered.pop();
        assert!(matches!(
            tokens.verify_access_token(&tampered),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn refresh_rotates_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        let account = seeded_account(&store).await;
        let tokens = service(store);

        let pair = tokens.issue(&account).await.unwrap();
        let rotated = tokens.refresh(&pair.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, pair.refresh_token);

        // The original token was consumed by the rotation.
        assert!(matches!(
            tokens.refresh(&pair.refresh_token).await,
            Err(AuthError::InvalidToken)
        ));

        // The rotated token is live.
        tokens.refresh(&rotated.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn revoked_token_cannot_refresh() {
        let store = Arc::new(MemoryStore::new());
        let account = seeded_account(&store).await;
        let tokens = service(store);

        let pair = tokens.issue(&account).await.unwrap();
        tokens.revoke(&pair.refresh_token).await.unwrap();
        assert!(matches!(
            tokens.refresh(&pair.refresh_token).await,
            Err(AuthError::InvalidToken)
        ));

        // Idempotent: revoking again is fine.
        tokens.revoke(&pair.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_refresh_token_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        let tokens = service(store);
        assert!(matches!(
            tokens.refresh("never-issued").await,
            Err(AuthError::InvalidToken)
        ));
    }
}
