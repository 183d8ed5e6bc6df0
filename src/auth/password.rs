//! Password hashing and verification using Argon2
//!
//! Hashes are argon2id in PHC string format, salt and parameters included.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::HubError;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, HubError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HubError::Internal(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored PHC hash
///
/// A stored value that is not a PHC string is an internal error, not a
/// failed login.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, HubError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| HubError::Internal(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("tomato-basil-42").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_password("tomato-basil-42", &hash).unwrap());
        assert!(!verify_password("tomato-basil-43", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let first = hash_password("same").unwrap();
        let second = hash_password("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_is_internal_error() {
        let err = verify_password("pw", "plain-text-value").unwrap_err();
        assert!(matches!(err, HubError::Internal(_)));
    }
}
