//! HTTP routes for homesense

pub mod auth_routes;
pub mod health;
pub mod response;
pub mod sensors;

pub use auth_routes::{handle_login, handle_register};
pub use health::health_check;
pub use response::{
    cors_preflight, method_not_allowed, not_found, BodyError, BoxBody, ErrorResponse,
};
pub use sensors::{handle_pump, handle_sensor, PumpField};
