//! Services behind the HTTP routes
//!
//! - `credentials`: login and registration against the user store
//! - `gateway`: sensor reads and pump writes, provider-agnostic
//! - `blynk`, `thingspeak`: the two IoT cloud providers

pub mod blynk;
pub mod credentials;
pub mod gateway;
pub mod thingspeak;

pub use blynk::{BlynkProvider, BlynkTokens};
pub use credentials::CredentialService;
pub use gateway::{
    build_http_client, validate_reading, Channel, PumpState, Reading, Sensor, SensorGateway,
    SensorProvider,
};
pub use thingspeak::{ChannelDescriptor, ThingSpeakChannels, ThingSpeakProvider};
