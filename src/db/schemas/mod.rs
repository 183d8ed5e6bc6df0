//! Database schemas for homesense

mod metadata;
mod user;

pub use metadata::Metadata;
pub use user::{UserDoc, UserView, USER_COLLECTION};
