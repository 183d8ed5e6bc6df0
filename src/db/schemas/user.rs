//! User document schema
//!
//! Stores dashboard login credentials.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct UserDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Login email, unique across the collection
    pub email: String,

    /// Argon2 PHC hash or plaintext, depending on the password policy in force
    /// when the user registered
    pub password: String,
}

impl UserDoc {
    /// Create a new user document
    pub fn new(email: String, password: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::now(),
            email,
            password,
        }
    }

    /// Client-facing view of this user, without the password field
    pub fn view(&self) -> UserView {
        UserView {
            id: self._id.map(|id| id.to_hex()),
            email: self.email.clone(),
            created_at: self
                .metadata
                .created_at
                .map(|at| at.to_chrono().to_rfc3339()),
        }
    }
}

/// User as returned by `/login` and `/register`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_omits_password() {
        let mut user = UserDoc::new("ada@example.com".into(), "$argon2id$secret".into());
        user._id = Some(ObjectId::new());

        let json = serde_json::to_value(user.view()).unwrap();
        assert_eq!(json["email"], "ada@example.com");
        assert!(json.get("password").is_none());
        assert_eq!(json["_id"], user._id.unwrap().to_hex());
        assert!(json["createdAt"].is_string());
    }

    #[test]
    fn test_email_index_is_unique() {
        let indices = UserDoc::into_indices();
        assert_eq!(indices.len(), 1);
        let (keys, opts) = &indices[0];
        assert_eq!(keys, &doc! { "email": 1 });
        assert_eq!(opts.as_ref().and_then(|o| o.unique), Some(true));
    }
}
