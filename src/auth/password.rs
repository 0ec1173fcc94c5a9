//! Credential hashing and verification.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::error::MesmerError;

/// Hash a password using Argon2id with a fresh random salt.
///
/// Accepts the empty string; length policy is the caller's concern.
pub fn hash_password(password: &str) -> Result<String, MesmerError> {
    let salt = SaltString::generate(&mut OsRng);

    let digest = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| MesmerError::Internal(format!("credential hashing: {}", e)))?;

    Ok(digest.to_string())
}

/// Verify a password against a stored PHC-format digest.
///
/// A malformed digest counts as a mismatch, never an error. The underlying
/// comparison is constant-time.
pub fn verify_password(password: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let digest = hash_password("correct horse battery").unwrap();

        assert!(verify_password("correct horse battery", &digest));
        assert!(!verify_password("correct horse butter", &digest));
        assert!(!verify_password("", &digest));
    }

    #[test]
    fn empty_password_is_accepted() {
        let digest = hash_password("").unwrap();
        assert!(verify_password("", &digest));
        assert!(!verify_password("x", &digest));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same input").unwrap();
        let b = hash_password("same input").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same input", &a));
        assert!(verify_password("same input", &b));
    }

    #[test]
    fn malformed_digest_is_a_mismatch() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", "$argon2id$v=19$garbage"));
    }
}
