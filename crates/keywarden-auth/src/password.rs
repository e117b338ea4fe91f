//! Password verification using Argon2id.
//!
//! Hashing lives at the store boundary (`keywarden-db`); this module
//! is the opaque one-way verify used by the login flow and the
//! old-password check on self-service password changes. An optional
//! pepper (server-side secret) is prepended to the password and must
//! match the pepper used during hashing.

use argon2::{Argon2, PasswordVerifier};

use crate::error::AuthError;

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::Crypto)` if the stored hash is malformed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    let argon2 = Argon2::default();
    match argon2.verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::PasswordHasher;
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;

    /// Helper: hash a password with optional pepper using Argon2id.
    fn hash(password: &str, pepper: Option<&str>) -> String {
        let peppered: String;
        let input = match pepper {
            Some(p) => {
                peppered = format!("{p}{password}");
                peppered.as_bytes()
            }
            None => password.as_bytes(),
        };
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(input, &salt)
            .expect("hashing failed")
            .to_string()
    }

    #[test]
    fn correct_password_matches() {
        let stored = hash("secret1", None);
        assert!(verify_password("secret1", &stored, None).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let stored = hash("secret1", None);
        assert!(!verify_password("secret2", &stored, None).unwrap());
    }

    #[test]
    fn pepper_is_applied() {
        let stored = hash("secret1", Some("pepper!"));
        assert!(verify_password("secret1", &stored, Some("pepper!")).unwrap());
        assert!(!verify_password("secret1", &stored, None).unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        assert!(verify_password("pw", "not-a-hash", None).is_err());
    }
}
