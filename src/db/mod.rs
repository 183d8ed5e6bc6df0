//! Persistence for user credentials

pub mod mongo;
pub mod schemas;
pub mod store;

pub use mongo::MongoClient;
pub use store::{MemoryUserStore, MongoUserStore, UserStore};
