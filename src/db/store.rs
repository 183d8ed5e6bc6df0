//! User store
//!
//! `UserStore` is the seam between the credential flow and persistence.
//! Production uses MongoDB; the in-memory store backs dev mode and tests.

use bson::{doc, oid::ObjectId};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{Metadata, UserDoc, USER_COLLECTION};
use crate::types::{HubError, Result};

/// Trait for user persistence (allows swapping the backend)
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup by email
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>>;

    /// Insert a new user, failing with `DuplicateKey` if the email exists
    async fn create(&self, user: UserDoc) -> Result<UserDoc>;

    /// Short backend name for health output
    fn kind(&self) -> &'static str;
}

// =============================================================================
// MongoDB Implementation
// =============================================================================

/// MongoDB-backed user store
pub struct MongoUserStore {
    users: MongoCollection<UserDoc>,
}

impl MongoUserStore {
    /// Open the users collection, creating the unique email index
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let users = mongo.collection::<UserDoc>(USER_COLLECTION).await?;
        debug!(db = %mongo.db_name(), "User collection ready");
        Ok(Self { users })
    }
}

#[async_trait::async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        self.users.find_one(doc! { "email": email }).await
    }

    async fn create(&self, mut user: UserDoc) -> Result<UserDoc> {
        let id = self.users.insert_one(&mut user).await?;
        user._id = Some(id);
        Ok(user)
    }

    fn kind(&self) -> &'static str {
        "mongodb"
    }
}

// =============================================================================
// In-memory Implementation
// =============================================================================

/// In-memory user store keyed by email
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserDoc>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn create(&self, mut user: UserDoc) -> Result<UserDoc> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(HubError::DuplicateKey(format!(
                "email '{}' already exists",
                user.email
            )));
        }

        user._id = Some(ObjectId::new());
        user.metadata = Metadata::now();
        users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryUserStore::new();
        let created = store
            .create(UserDoc::new("ada@example.com".into(), "pw".into()))
            .await
            .unwrap();
        assert!(created._id.is_some());

        let found = store.find_by_email("ada@example.com").await.unwrap();
        assert_eq!(found, Some(created));
        assert!(store.find_by_email("ADA@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store
            .create(UserDoc::new("ada@example.com".into(), "pw".into()))
            .await
            .unwrap();

        let err = store
            .create(UserDoc::new("ada@example.com".into(), "other".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::DuplicateKey(_)));
    }
}
