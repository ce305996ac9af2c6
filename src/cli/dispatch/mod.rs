//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the
//! appropriate action, such as starting the API server with its full
//! configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, cache, etl};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches.get_one::<String>("dsn").cloned();

    crate::cli::commands::validate(matches).map_err(|err| anyhow::anyhow!(err))?;

    let cache_opts = cache::Options::parse(matches)?;
    let auth_opts = auth::Options::parse(matches)?;
    let airbyte = etl::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        cache_backend: cache_opts.backend,
        redis_url: cache_opts.redis_url,
        jwt_secret: auth_opts.jwt_secret,
        access_token_ttl_seconds: auth_opts.access_token_ttl_seconds,
        refresh_token_ttl_seconds: auth_opts.refresh_token_ttl_seconds,
        challenge_ttl_seconds: auth_opts.challenge_ttl_seconds,
        bootstrap_token: auth_opts.bootstrap_token,
        enforce_mfa: auth_opts.enforce_mfa,
        totp_issuer: auth_opts.totp_issuer,
        airbyte,
    }))
}
