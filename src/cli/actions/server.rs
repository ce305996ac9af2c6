use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::{sync::Arc, time::Duration};
use tracing::warn;

use crate::{
    accounts::AccountService,
    api::{self, AppState},
    auth::{LoginService, TokenService},
    bootstrap,
    cache::{self, CacheBackend},
    etl::{AirbyteConfig, AirbyteProvider, EtlProvider},
    store::Stores,
};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub cache_backend: CacheBackend,
    pub redis_url: Option<String>,
    pub jwt_secret: SecretString,
    pub access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,
    pub challenge_ttl_seconds: u64,
    pub bootstrap_token: SecretString,
    pub enforce_mfa: bool,
    pub totp_issuer: String,
    pub airbyte: Option<AirbyteConfig>,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the store or cache cannot be reached, the bootstrap
/// token check fails, or the server fails to start. A bootstrap mismatch is
/// fatal on purpose: the process must not serve traffic with a tampered
/// configuration.
pub async fn execute(args: Args) -> Result<()> {
    let stores = match &args.dsn {
        Some(dsn) => Stores::connect_postgres(dsn)
            .await
            .context("Failed to connect to database")?,
        None => {
            warn!("no DSN configured; falling back to the in-memory store");
            Stores::in_memory()
        }
    };

    bootstrap::load_or_initialize(stores.bootstrap.as_ref(), args.bootstrap_token.expose_secret())
        .await
        .context("Bootstrap token check failed")?;

    let cache = cache::connect(args.cache_backend, args.redis_url.as_deref())
        .await
        .context("Failed to initialize cache backend")?;

    let tokens = TokenService::new(
        stores.accounts.clone(),
        cache.clone(),
        args.jwt_secret,
        Duration::from_secs(args.access_token_ttl_seconds),
        Duration::from_secs(args.refresh_token_ttl_seconds),
    );
    let login = LoginService::new(
        stores.accounts.clone(),
        cache.clone(),
        tokens.clone(),
        Duration::from_secs(args.challenge_ttl_seconds),
        args.totp_issuer,
    );
    let accounts = AccountService::new(stores.accounts.clone());

    let etl = args
        .airbyte
        .map(|config| Arc::new(AirbyteProvider::new(config, cache.clone())) as Arc<dyn EtlProvider>);

    let state = Arc::new(AppState {
        login,
        tokens,
        accounts,
        stores,
        etl,
        enforce_mfa: args.enforce_mfa,
    });

    api::serve(args.port, state).await
}
