//! Time-based one-time codes (RFC 6238, SHA-1, 6 digits, 30-second steps).
//!
//! Secrets are 160 bits of OS randomness, base-32 encoded without padding so
//! they paste directly into authenticator apps. Verification tolerates one
//! step of clock drift in each direction and compares codes in constant time.

use anyhow::{anyhow, Context};
use base32::Alphabet;
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha1::Sha1;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::error::AuthError;

const SECRET_BYTES: usize = 20;
const TIME_STEP_SECONDS: u64 = 30;
const CODE_MODULUS: u32 = 1_000_000;

/// Generate a new 160-bit shared secret, base-32 encoded without padding.
///
/// # Errors
/// Fails only when the OS entropy source is unavailable.
pub fn generate_secret() -> Result<String, AuthError> {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate totp secret")?;
    Ok(base32::encode(Alphabet::Rfc4648 { padding: false }, &bytes))
}

/// Derive the 6-digit code for the time step containing `at`.
///
/// # Errors
/// Returns `Validation` if the secret is not valid unpadded base-32.
pub fn derive_code(secret: &str, at: SystemTime) -> Result<u32, AuthError> {
    let key = base32::decode(Alphabet::Rfc4648 { padding: false }, secret)
        .ok_or_else(|| AuthError::Validation("secret is not valid base32".to_string()))?;

    let unix = at
        .duration_since(UNIX_EPOCH)
        .context("timestamp before unix epoch")?
        .as_secs();
    let counter = unix / TIME_STEP_SECONDS;

    let mut mac = Hmac::<Sha1>::new_from_slice(&key)
        .map_err(|_| anyhow!("hmac rejected totp key"))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation: low nibble of the last byte selects a 4-byte
    // window, read big-endian with the top bit cleared.
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let code = u32::from_be_bytes([
        digest[offset],
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]) & 0x7fff_ffff;

    Ok(code % CODE_MODULUS)
}

/// Check a submitted code against the current step and one step of drift in
/// each direction.
///
/// All three windows are always evaluated and the comparisons never
/// short-circuit, so timing does not reveal a partial match.
///
/// # Errors
/// Returns `Validation` if the secret is not valid unpadded base-32.
pub fn verify(secret: &str, submitted: u32, now: SystemTime) -> Result<bool, AuthError> {
    let step = Duration::from_secs(TIME_STEP_SECONDS);
    let windows = [
        now.checked_sub(step),
        Some(now),
        now.checked_add(step),
    ];

    let mut matched = false;
    for at in windows.into_iter().flatten() {
        matched |= constant_time_eq(derive_code(secret, at)?, submitted);
    }
    Ok(matched)
}

/// Build the otpauth:// provisioning URI consumed by authenticator apps.
#[must_use]
pub fn provisioning_uri(issuer: &str, email: &str, secret: &str) -> String {
    format!("otpauth://totp/{issuer}:{email}?secret={secret}&issuer={issuer}")
}

// Fixed-width XOR-and-OR-reduce so the comparison cannot be compiled into a
// branch on the first differing bit.
fn constant_time_eq(a: u32, b: u32) -> bool {
    let mut diff = 0u32;
    diff |= a ^ b;
    diff == 0
}
