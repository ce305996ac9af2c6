//! End-to-end authentication scenarios against the in-memory store and
//! cache backends.

use std::{sync::Arc, time::Duration};

use secrecy::SecretString;

use dataforge::{
    accounts::AccountService,
    auth::{password, totp, AuthError, LoginOutcome, LoginService, TokenService},
    bootstrap,
    cache::{Cache, MemoryCache},
    store::{AccountRole, Stores},
};

struct Harness {
    accounts: AccountService,
    login: LoginService,
    tokens: TokenService,
    stores: Stores,
    cache: Arc<MemoryCache>,
}

fn harness_with_challenge_ttl(challenge_ttl: Duration) -> Harness {
    let stores = Stores::in_memory();
    let cache = Arc::new(MemoryCache::new());

    let tokens = TokenService::new(
        stores.accounts.clone(),
        cache.clone(),
        SecretString::from("integration-signing-key"),
        Duration::from_secs(900),
        Duration::from_secs(3600),
    );
    let login = LoginService::new(
        stores.accounts.clone(),
        cache.clone(),
        tokens.clone(),
        challenge_ttl,
        "dataforge".to_string(),
    );
    let accounts = AccountService::new(stores.accounts.clone());

    Harness {
        accounts,
        login,
        tokens,
        stores,
        cache,
    }
}

fn harness() -> Harness {
    harness_with_challenge_ttl(Duration::from_secs(3600))
}

fn code_for(secret: &str) -> String {
    format!(
        "{:06}",
        totp::derive_code(secret, std::time::SystemTime::now()).unwrap()
    )
}

#[tokio::test]
async fn scenario_a_mfa_disabled_login_issues_tokens_directly() {
    let h = harness();
    h.accounts
        .create("Alice", "alice@example.com", "Str0ng!Pw", AccountRole::Admin)
        .await
        .unwrap();

    let outcome = h.login.login("alice@example.com", "Str0ng!Pw").await.unwrap();
    let pair = match outcome {
        LoginOutcome::Authenticated(pair) => pair,
        LoginOutcome::MfaRequired { .. } => panic!("no challenge expected"),
    };

    // Tokens are usable: the access token verifies, the refresh token rotates.
    let claims = h.tokens.verify_access_token(&pair.access_token).unwrap();
    assert_eq!(claims.email, "alice@example.com");
    h.tokens.refresh(&pair.refresh_token).await.unwrap();
}

#[tokio::test]
async fn scenario_b_mfa_enabled_login_requires_the_challenge_step() {
    let h = harness();
    let created = h
        .accounts
        .create("Bob", "bob@example.com", "Str0ng!Pw", AccountRole::Guest)
        .await
        .unwrap();

    // Enroll: fetch the provisioning URI, then confirm with a live code.
    let uri = h.login.totp_uri("bob@example.com", "Str0ng!Pw").await.unwrap();
    assert!(uri.contains(&created.mfa_secret));
    h.login
        .confirm_mfa("bob@example.com", "Str0ng!Pw", &code_for(&created.mfa_secret))
        .await
        .unwrap();

    // Password step alone yields a challenge, never tokens.
    let challenge_id = match h.login.login("bob@example.com", "Str0ng!Pw").await.unwrap() {
        LoginOutcome::MfaRequired { challenge_id } => challenge_id,
        LoginOutcome::Authenticated(_) => panic!("expected an mfa challenge"),
    };

    // Correct code within the window completes the login.
    let pair = h
        .login
        .verify_mfa(&challenge_id, &code_for(&created.mfa_secret))
        .await
        .unwrap();
    assert!(!pair.access_token.is_empty());

    // The challenge was consumed; the same submission replayed fails.
    let replay = h
        .login
        .verify_mfa(&challenge_id, &code_for(&created.mfa_secret))
        .await
        .unwrap_err();
    assert!(matches!(replay, AuthError::ChallengeExpiredOrInvalid));
}

#[tokio::test]
async fn scenario_c_revoked_refresh_token_is_dead() {
    let h = harness();
    h.accounts
        .create("Carol", "carol@example.com", "Str0ng!Pw", AccountRole::Admin)
        .await
        .unwrap();

    let pair = match h.login.login("carol@example.com", "Str0ng!Pw").await.unwrap() {
        LoginOutcome::Authenticated(pair) => pair,
        LoginOutcome::MfaRequired { .. } => panic!("no challenge expected"),
    };

    h.tokens.revoke(&pair.refresh_token).await.unwrap();
    assert!(matches!(
        h.tokens.refresh(&pair.refresh_token).await,
        Err(AuthError::InvalidToken)
    ));
}

#[tokio::test]
async fn refresh_rotation_succeeds_exactly_once() {
    let h = harness();
    h.accounts
        .create("Dave", "dave@example.com", "Str0ng!Pw", AccountRole::Guest)
        .await
        .unwrap();

    let pair = match h.login.login("dave@example.com", "Str0ng!Pw").await.unwrap() {
        LoginOutcome::Authenticated(pair) => pair,
        LoginOutcome::MfaRequired { .. } => panic!("no challenge expected"),
    };

    let rotated = h.tokens.refresh(&pair.refresh_token).await.unwrap();
    assert!(matches!(
        h.tokens.refresh(&pair.refresh_token).await,
        Err(AuthError::InvalidToken)
    ));
    h.tokens.refresh(&rotated.refresh_token).await.unwrap();
}

#[tokio::test]
async fn expired_challenge_cannot_complete_mfa() {
    let h = harness_with_challenge_ttl(Duration::from_millis(20));
    let created = h
        .accounts
        .create("Erin", "erin@example.com", "Str0ng!Pw", AccountRole::Guest)
        .await
        .unwrap();
    h.login
        .confirm_mfa("erin@example.com", "Str0ng!Pw", &code_for(&created.mfa_secret))
        .await
        .unwrap();

    let challenge_id = match h.login.login("erin@example.com", "Str0ng!Pw").await.unwrap() {
        LoginOutcome::MfaRequired { challenge_id } => challenge_id,
        LoginOutcome::Authenticated(_) => panic!("expected an mfa challenge"),
    };

    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = h
        .login
        .verify_mfa(&challenge_id, &code_for(&created.mfa_secret))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ChallengeExpiredOrInvalid));
}

#[tokio::test]
async fn concurrent_mfa_submissions_have_at_most_one_winner() {
    let h = harness();
    let created = h
        .accounts
        .create("Frank", "frank@example.com", "Str0ng!Pw", AccountRole::Guest)
        .await
        .unwrap();
    h.login
        .confirm_mfa(
            "frank@example.com",
            "Str0ng!Pw",
            &code_for(&created.mfa_secret),
        )
        .await
        .unwrap();

    let challenge_id = match h.login.login("frank@example.com", "Str0ng!Pw").await.unwrap() {
        LoginOutcome::MfaRequired { challenge_id } => challenge_id,
        LoginOutcome::Authenticated(_) => panic!("expected an mfa challenge"),
    };

    let mut handles = Vec::new();
    for _ in 0..4 {
        let login = h.login.clone();
        let challenge_id = challenge_id.clone();
        let code = code_for(&created.mfa_secret);
        handles.push(tokio::spawn(async move {
            login.verify_mfa(&challenge_id, &code).await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);
}

#[tokio::test]
async fn bootstrap_token_is_immutable_across_restarts() {
    let h = harness();
    let store = h.stores.bootstrap;

    // First startup persists the token.
    bootstrap::load_or_initialize(store.as_ref(), "abc").await.unwrap();

    // A tampered token halts startup.
    assert!(bootstrap::load_or_initialize(store.as_ref(), "xyz")
        .await
        .is_err());

    // The original token keeps working.
    bootstrap::load_or_initialize(store.as_ref(), "abc").await.unwrap();
}

#[tokio::test]
async fn cache_namespaces_do_not_collide() {
    let h = harness();
    h.accounts
        .create("Grace", "grace@example.com", "Str0ng!Pw", AccountRole::Guest)
        .await
        .unwrap();

    // A value parked under the provider namespace must be invisible to the
    // auth flows even if an id happens to match.
    h.cache
        .set("etl-access-token:airbyte", "provider-token", Duration::from_secs(60))
        .await
        .unwrap();

    let err = h.login.verify_mfa("airbyte", "123456").await.unwrap_err();
    assert!(matches!(err, AuthError::ChallengeExpiredOrInvalid));
    assert!(matches!(
        h.tokens.refresh("airbyte").await,
        Err(AuthError::InvalidToken)
    ));
}

#[tokio::test]
async fn password_hashes_never_store_plaintext() {
    let h = harness();
    let created = h
        .accounts
        .create("Heidi", "heidi@example.com", "Str0ng!Pw", AccountRole::Guest)
        .await
        .unwrap();

    assert_ne!(created.password_hash, "Str0ng!Pw");
    password::verify(&created.password_hash, "Str0ng!Pw").unwrap();
}
