pub mod auth;
pub mod cache;
pub mod etl;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

use self::cache::{ARG_CACHE_BACKEND, ARG_REDIS_URL};

/// Validate cross-argument constraints clap cannot express on its own.
///
/// # Errors
/// Returns an error string if the redis cache backend is selected without a
/// redis URL.
pub fn validate(matches: &clap::ArgMatches) -> Result<(), String> {
    let backend = matches
        .get_one::<String>(ARG_CACHE_BACKEND)
        .map(String::as_str)
        .unwrap_or("memory");

    if backend == "redis" && !matches.contains_id(ARG_REDIS_URL) {
        return Err(format!(
            "Missing required argument: --{ARG_REDIS_URL} (required for the redis cache backend)"
        ));
    }
    Ok(())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("dataforge")
        .about("Multi-tenant data platform management API")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("DATAFORGE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("PostgreSQL connection string; omit to run against the in-memory store")
                .env("DATAFORGE_DSN"),
        );

    let command = cache::with_args(command);
    let command = auth::with_args(command);
    let command = etl::with_args(command);
    logging::with_args(command)
}
