//! Shared types

pub mod error;

pub use error::{HubError, Result};
