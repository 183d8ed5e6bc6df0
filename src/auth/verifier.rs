//! Password policy
//!
//! Decides how a submitted password is stored at registration and compared
//! at login.

use crate::auth::password::{hash_password, verify_password};
use crate::config::PasswordPolicy;
use crate::types::Result;

#[derive(Debug, Clone, Copy)]
pub struct PasswordVerifier {
    policy: PasswordPolicy,
}

impl PasswordVerifier {
    pub fn new(policy: PasswordPolicy) -> Self {
        Self { policy }
    }

    /// Value to persist for a newly registered password
    pub fn prepare(&self, password: &str) -> Result<String> {
        match self.policy {
            PasswordPolicy::Argon2 => hash_password(password),
            PasswordPolicy::Plaintext => Ok(password.to_string()),
        }
    }

    /// Whether `submitted` matches the stored value
    pub fn matches(&self, submitted: &str, stored: &str) -> Result<bool> {
        match self.policy {
            PasswordPolicy::Argon2 => verify_password(submitted, stored),
            // no trimming or case folding
            PasswordPolicy::Plaintext => Ok(submitted == stored),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HubError;

    #[test]
    fn test_plaintext_is_exact() {
        let verifier = PasswordVerifier::new(PasswordPolicy::Plaintext);
        let stored = verifier.prepare("Secret").unwrap();
        assert_eq!(stored, "Secret");

        assert!(verifier.matches("Secret", &stored).unwrap());
        assert!(!verifier.matches("secret", &stored).unwrap());
        assert!(!verifier.matches("Secret ", &stored).unwrap());
    }

    #[test]
    fn test_argon2_never_stores_plaintext() {
        let verifier = PasswordVerifier::new(PasswordPolicy::Argon2);
        let stored = verifier.prepare("Secret").unwrap();
        assert_ne!(stored, "Secret");
        assert!(verifier.matches("Secret", &stored).unwrap());
        assert!(!verifier.matches("secret", &stored).unwrap());
    }

    #[test]
    fn test_argon2_rejects_plaintext_record() {
        let verifier = PasswordVerifier::new(PasswordPolicy::Argon2);
        let err = verifier.matches("Secret", "Secret").unwrap_err();
        assert!(matches!(err, HubError::Internal(_)));
    }
}
