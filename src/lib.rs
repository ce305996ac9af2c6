//! # Dataforge (Data Platform Management API)
//!
//! `dataforge` is a multi-tenant management API for a data platform:
//! organizations, accounts, projects, and data sources, fronted by a thin
//! axum HTTP layer.
//!
//! ## Authentication & MFA
//!
//! The heart of the service is its authentication core:
//!
//! - **TOTP** one-time codes (RFC 6238, 30-second steps, ±1 window, constant
//!   time comparison). Every account gets a secret at creation, so enabling
//!   MFA later is a single flag flip.
//! - **Login state machine**: password check, then either direct token
//!   issuance or a single-use challenge with a bounded lifetime. The MFA
//!   step trusts possession of a live challenge id, never a replayed
//!   password.
//! - **Token lifecycle**: short-lived signed access tokens plus opaque
//!   refresh tokens that rotate on every use; only token hashes are stored,
//!   so neither a log nor a cache dump yields usable credentials.
//!
//! ## Cache
//!
//! Challenges, refresh-token records, and provider access tokens live in a
//! TTL-aware cache with interchangeable backends: embedded in-process for a
//! single node, redis when instances share state. The backend is chosen once
//! at startup and injected everywhere.
//!
//! ## Bootstrap invariant
//!
//! The install-time bootstrap token is persisted on first run; any later
//! startup with a different token refuses to serve, as a tamper signal.

pub mod accounts;
pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod cache;
pub mod cli;
pub mod etl;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
