use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use secrecy::SecretString;
use url::Url;

use crate::etl::AirbyteConfig;

pub const ARG_AIRBYTE_ENDPOINT: &str = "airbyte-endpoint";
pub const ARG_AIRBYTE_CLIENT_ID: &str = "airbyte-client-id";
pub const ARG_AIRBYTE_CLIENT_SECRET: &str = "airbyte-client-secret";
pub const ARG_AIRBYTE_CLOUD: &str = "airbyte-cloud";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AIRBYTE_ENDPOINT)
                .long(ARG_AIRBYTE_ENDPOINT)
                .help("Airbyte base URL; omit to run without an ETL provider")
                .env("DATAFORGE_AIRBYTE_ENDPOINT"),
        )
        .arg(
            Arg::new(ARG_AIRBYTE_CLIENT_ID)
                .long(ARG_AIRBYTE_CLIENT_ID)
                .help("Airbyte application client id")
                .env("DATAFORGE_AIRBYTE_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_AIRBYTE_CLIENT_SECRET)
                .long(ARG_AIRBYTE_CLIENT_SECRET)
                .help("Airbyte application client secret")
                .env("DATAFORGE_AIRBYTE_CLIENT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_AIRBYTE_CLOUD)
                .long(ARG_AIRBYTE_CLOUD)
                .help("Target Airbyte Cloud instead of a self-hosted deployment")
                .env("DATAFORGE_AIRBYTE_CLOUD")
                .action(ArgAction::SetTrue),
        )
}

/// Provider configuration is all-or-nothing: either the endpoint plus
/// credentials are present, or the provider is disabled.
///
/// # Errors
/// Returns an error when only part of the configuration is supplied.
pub fn parse(matches: &clap::ArgMatches) -> Result<Option<AirbyteConfig>> {
    let endpoint = matches.get_one::<String>(ARG_AIRBYTE_ENDPOINT).cloned();
    let client_id = matches.get_one::<String>(ARG_AIRBYTE_CLIENT_ID).cloned();
    let client_secret = matches.get_one::<String>(ARG_AIRBYTE_CLIENT_SECRET).cloned();

    match (endpoint, client_id, client_secret) {
        (Some(endpoint), Some(client_id), Some(client_secret)) => {
            Url::parse(&endpoint)
                .with_context(|| format!("invalid airbyte endpoint: {endpoint}"))?;
            Ok(Some(AirbyteConfig {
                endpoint,
                client_id,
                client_secret: SecretString::from(client_secret),
                cloud: matches.get_flag(ARG_AIRBYTE_CLOUD),
            }))
        }
        (None, None, None) => Ok(None),
        _ => anyhow::bail!(
            "incomplete airbyte configuration: endpoint, client id, and client secret are all required"
        ),
    }
}
