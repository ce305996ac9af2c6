//! Error taxonomy for the authentication core.
//!
//! Authentication failures carry enough detail for logs and tests, but the
//! HTTP layer collapses all of them into a generic "unauthorized" so callers
//! cannot distinguish a missing account from a wrong password or a stale
//! challenge.

use thiserror::Error;

/// A password strength rule that was violated.
///
/// Rules are checked in a fixed order (empty, length, uppercase, lowercase,
/// digit, special) and the first failing rule is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("password must not be empty")]
    Empty,
    #[error("password must be at least 8 characters long")]
    TooShort,
    #[error("password must contain at least one uppercase letter")]
    MissingUppercase,
    #[error("password must contain at least one lowercase letter")]
    MissingLowercase,
    #[error("password must contain at least one number")]
    MissingDigit,
    #[error("password must contain at least one special character")]
    MissingSpecial,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input that never reached credential verification.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Covers both "no such account" and "wrong password".
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The submitted one-time code did not match any accepted window.
    #[error("invalid one-time code")]
    InvalidCode,

    /// The login challenge was consumed, expired, or never existed.
    #[error("challenge expired or invalid")]
    ChallengeExpiredOrInvalid,

    /// The refresh token was revoked, rotated away, expired, or never issued.
    #[error("invalid or expired refresh token")]
    InvalidToken,

    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    /// Store or cache unreachable; surfaced as a transient server error.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(anyhow::Error),

    /// Anything else (entropy exhaustion, signing failure, corrupt state).
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// True for failures that must be reported as a bare 401 upstream.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::InvalidCode
                | Self::ChallengeExpiredOrInvalid
                | Self::InvalidToken
        )
    }
}
