//! Authentication for homesense
//!
//! Provides:
//! - Password hashing with Argon2
//! - The configured password policy (argon2 or plaintext comparison)

pub mod password;
pub mod verifier;

pub use password::{hash_password, verify_password};
pub use verifier::PasswordVerifier;
