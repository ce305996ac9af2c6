use anyhow::{Context, Result};
use clap::{Arg, Command};

use crate::cache::CacheBackend;

pub const ARG_CACHE_BACKEND: &str = "cache-backend";
pub const ARG_REDIS_URL: &str = "redis-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CACHE_BACKEND)
                .long(ARG_CACHE_BACKEND)
                .help("Cache backend: memory (embedded) or redis (shared)")
                .env("DATAFORGE_CACHE_BACKEND")
                .default_value("memory")
                .value_parser(["memory", "redis"]),
        )
        .arg(
            Arg::new(ARG_REDIS_URL)
                .long(ARG_REDIS_URL)
                .help("Redis connection URL, required for the redis cache backend")
                .env("DATAFORGE_REDIS_URL"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub backend: CacheBackend,
    pub redis_url: Option<String>,
}

impl Options {
    /// # Errors
    /// Returns an error if the backend name does not parse.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let backend = matches
            .get_one::<String>(ARG_CACHE_BACKEND)
            .map(String::as_str)
            .unwrap_or("memory")
            .parse::<CacheBackend>()
            .map_err(|err| anyhow::anyhow!(err))
            .context("invalid --cache-backend")?;

        Ok(Self {
            backend,
            redis_url: matches.get_one::<String>(ARG_REDIS_URL).cloned(),
        })
    }
}
