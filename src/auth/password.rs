//! Password strength rules and irreversible hashing.
//!
//! Hashing uses bcrypt at the default cost; verification goes through
//! bcrypt's own constant-time comparator. Plaintext passwords are never
//! logged or returned.

use anyhow::Context;

use super::error::{AuthError, PolicyViolation};

const MIN_LENGTH: usize = 8;

/// Check a candidate password against the strength rules, reporting the
/// first violated rule.
///
/// # Errors
/// Returns the violated rule; the ordering (empty, length, uppercase,
/// lowercase, digit, special) is fixed so error messages are deterministic.
pub fn check_strength(password: &str) -> Result<(), PolicyViolation> {
    if password.is_empty() {
        return Err(PolicyViolation::Empty);
    }
    if password.len() < MIN_LENGTH {
        return Err(PolicyViolation::TooShort);
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        has_upper |= c.is_uppercase();
        has_lower |= c.is_lowercase();
        has_digit |= c.is_ascii_digit();
        has_special |= is_special(c);
    }

    if !has_upper {
        return Err(PolicyViolation::MissingUppercase);
    }
    if !has_lower {
        return Err(PolicyViolation::MissingLowercase);
    }
    if !has_digit {
        return Err(PolicyViolation::MissingDigit);
    }
    if !has_special {
        return Err(PolicyViolation::MissingSpecial);
    }

    Ok(())
}

/// Hash a password with bcrypt at the default cost.
///
/// # Errors
/// Fails only if bcrypt itself fails (entropy exhaustion).
pub fn hash(password: &str) -> Result<String, AuthError> {
    let hashed = bcrypt::hash(password, bcrypt::DEFAULT_COST).context("bcrypt hash failed")?;
    Ok(hashed)
}

/// Verify a password against a stored bcrypt hash.
///
/// # Errors
/// Returns `InvalidCredentials` on mismatch or on an unparseable hash, so
/// callers see a single failure mode.
pub fn verify(stored_hash: &str, password: &str) -> Result<(), AuthError> {
    match bcrypt::verify(password, stored_hash) {
        Ok(true) => Ok(()),
        _ => Err(AuthError::InvalidCredentials),
    }
}

fn is_special(c: char) -> bool {
    c.is_ascii_punctuation() || (!c.is_ascii() && !c.is_alphanumeric() && !c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_strong_password() {
        assert!(check_strength("Str0ng!Pw").is_ok());
    }

    #[test]
    fn first_failing_rule_wins() {
        assert_eq!(check_strength(""), Err(PolicyViolation::Empty));
        assert_eq!(check_strength("aB1!"), Err(PolicyViolation::TooShort));
        assert_eq!(
            check_strength("lower1!lower"),
            Err(PolicyViolation::MissingUppercase)
        );
        assert_eq!(
            check_strength("UPPER1!UPPER"),
            Err(PolicyViolation::MissingLowercase)
        );
        assert_eq!(
            check_strength("NoDigits!"),
            Err(PolicyViolation::MissingDigit)
        );
        assert_eq!(
            check_strength("NoSpecial1"),
            Err(PolicyViolation::MissingSpecial)
        );
    }

    #[test]
    fn hash_round_trips() {
        let hashed = hash("Str0ng!Pw").unwrap();
        assert_ne!(hashed, "Str0ng!Pw");
        assert!(verify(&hashed, "Str0ng!Pw").is_ok());
        assert!(matches!(
            verify(&hashed, "Str0ng!Pwx"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(matches!(
            verify("not-a-bcrypt-hash", "Str0ng!Pw"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
