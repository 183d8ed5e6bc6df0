//! homesense - backend for a home IoT dashboard
//!
//! Two concerns behind one HTTP server:
//!
//! - **Credentials**: login and registration against a MongoDB `users` collection
//! - **Sensors**: pass-through reads of plant moisture, gas, temperature,
//!   humidity and flame, plus water pump control, against Blynk or ThingSpeak

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{HubError, Result};
