//! Login and registration
//!
//! One store call per operation: a lookup for login, an insert for
//! registration. Email uniqueness is left to the store.

use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::PasswordVerifier;
use crate::db::schemas::UserDoc;
use crate::db::UserStore;
use crate::types::{HubError, Result};

pub struct CredentialService {
    store: Arc<dyn UserStore>,
    verifier: PasswordVerifier,
}

impl CredentialService {
    pub fn new(store: Arc<dyn UserStore>, verifier: PasswordVerifier) -> Self {
        Self { store, verifier }
    }

    pub fn store_kind(&self) -> &'static str {
        self.store.kind()
    }

    /// Check credentials and return the stored user
    ///
    /// Unknown email is `NotFound`, wrong password is `Unauthorized`.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserDoc> {
        let user = match self.store.find_by_email(email).await? {
            Some(user) => user,
            None => {
                warn!("Login failed - user not found: {}", email);
                return Err(HubError::NotFound(format!("no user with email '{}'", email)));
            }
        };

        if !self.verifier.matches(password, &user.password)? {
            warn!("Login failed - invalid password: {}", email);
            return Err(HubError::Unauthorized(format!("password mismatch for '{}'", email)));
        }

        info!("Login succeeded: {}", email);
        Ok(user)
    }

    /// Create a user, storing the password under the active policy
    pub async fn register(&self, email: &str, password: &str) -> Result<UserDoc> {
        let stored_password = self.verifier.prepare(password)?;
        let user = self
            .store
            .create(UserDoc::new(email.to_string(), stored_password))
            .await?;

        info!("Registered user: {}", email);
        Ok(user)
    }
}
