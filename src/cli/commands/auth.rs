use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_ACCESS_TOKEN_TTL: &str = "access-token-ttl-seconds";
pub const ARG_REFRESH_TOKEN_TTL: &str = "refresh-token-ttl-seconds";
pub const ARG_CHALLENGE_TTL: &str = "challenge-ttl-seconds";
pub const ARG_BOOTSTRAP_TOKEN: &str = "bootstrap-token";
pub const ARG_ENFORCE_MFA: &str = "enforce-mfa";
pub const ARG_TOTP_ISSUER: &str = "totp-issuer";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Symmetric signing key for access tokens")
                .env("DATAFORGE_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_TTL)
                .long(ARG_ACCESS_TOKEN_TTL)
                .help("Access token lifetime in seconds")
                .env("DATAFORGE_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TOKEN_TTL)
                .long(ARG_REFRESH_TOKEN_TTL)
                .help("Refresh token lifetime in seconds")
                .env("DATAFORGE_REFRESH_TOKEN_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_CHALLENGE_TTL)
                .long(ARG_CHALLENGE_TTL)
                .help("MFA login challenge lifetime in seconds")
                .env("DATAFORGE_CHALLENGE_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_BOOTSTRAP_TOKEN)
                .long(ARG_BOOTSTRAP_TOKEN)
                .help("Install-time bootstrap token; must never change once persisted")
                .env("DATAFORGE_BOOTSTRAP_TOKEN")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_ENFORCE_MFA)
                .long(ARG_ENFORCE_MFA)
                .help("Advertise to clients that MFA enrollment is mandatory")
                .env("DATAFORGE_ENFORCE_MFA")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_TOTP_ISSUER)
                .long(ARG_TOTP_ISSUER)
                .help("Issuer label shown in authenticator apps")
                .env("DATAFORGE_TOTP_ISSUER")
                .default_value("dataforge"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,
    pub challenge_ttl_seconds: u64,
    pub bootstrap_token: SecretString,
    pub enforce_mfa: bool,
    pub totp_issuer: String,
}

impl Options {
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let jwt_secret = matches
            .get_one::<String>(ARG_JWT_SECRET)
            .cloned()
            .context("missing required argument: --jwt-secret")?;
        let bootstrap_token = matches
            .get_one::<String>(ARG_BOOTSTRAP_TOKEN)
            .cloned()
            .context("missing required argument: --bootstrap-token")?;

        Ok(Self {
            jwt_secret: SecretString::from(jwt_secret),
            access_token_ttl_seconds: matches
                .get_one::<u64>(ARG_ACCESS_TOKEN_TTL)
                .copied()
                .unwrap_or(900),
            refresh_token_ttl_seconds: matches
                .get_one::<u64>(ARG_REFRESH_TOKEN_TTL)
                .copied()
                .unwrap_or(604_800),
            challenge_ttl_seconds: matches
                .get_one::<u64>(ARG_CHALLENGE_TTL)
                .copied()
                .unwrap_or(3600),
            bootstrap_token: SecretString::from(bootstrap_token),
            enforce_mfa: matches.get_flag(ARG_ENFORCE_MFA),
            totp_issuer: matches
                .get_one::<String>(ARG_TOTP_ISSUER)
                .cloned()
                .unwrap_or_else(|| "dataforge".to_string()),
        })
    }
}
