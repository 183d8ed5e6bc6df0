//! Sensor/actuator gateway
//!
//! Maps dashboard sensors onto provider channels and slots, then performs a
//! single round trip to the IoT cloud per request:
//!
//! ```text
//! GET /api/temperature ─► SensorGateway::read ─► SensorProvider::fetch_field ─► cloud
//!                                │
//!                        validate_reading
//! ```
//!
//! There is no retry, caching or batching. A failed call surfaces to the
//! caller as `HubError::Upstream`.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::{HubError, Result};

/// A provider data stream with its own credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Soil moisture sensor and water pump
    PlantWatering,
    /// Gas, temperature, humidity and flame sensors
    Environment,
}

/// Readable sensors exposed by the dashboard API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Moisture,
    Gas,
    Temperature,
    Humidity,
    Flame,
}

impl Sensor {
    /// JSON key the reading is returned under
    pub fn key(&self) -> &'static str {
        match self {
            Self::Moisture => "moisture",
            Self::Gas => "gas",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Flame => "flame",
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            Self::Moisture => Channel::PlantWatering,
            Self::Gas | Self::Temperature | Self::Humidity | Self::Flame => Channel::Environment,
        }
    }
}

/// Requested water pump state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    On,
    Off,
}

impl PumpState {
    /// Parse `"on"` / `"off"`; anything else is rejected
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            other => Err(HubError::BadRequest(format!(
                "Invalid pump state '{}', expected \"on\" or \"off\"",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }

    /// Value written to the actuator slot
    pub fn pin_value(&self) -> u8 {
        match self {
            Self::On => 1,
            Self::Off => 0,
        }
    }
}

/// A validated scalar, serialized exactly as the provider sent it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Reading(Value);

impl Reading {
    pub fn value(&self) -> &Value {
        &self.0
    }
}

/// Check that an upstream scalar is a usable number
///
/// JSON numbers pass. Strings pass when they parse to a finite number and
/// keep their original text. `"nan"`, `null`, objects and anything
/// non-numeric fail.
pub fn validate_reading(raw: Value) -> Result<Reading> {
    match &raw {
        Value::Number(_) => Ok(Reading(raw)),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.eq_ignore_ascii_case("nan") {
                return Err(HubError::Upstream("sensor reported nan".to_string()));
            }
            match trimmed.parse::<f64>() {
                Ok(number) if number.is_finite() => Ok(Reading(raw)),
                _ => Err(HubError::Upstream(format!(
                    "non-numeric sensor value '{}'",
                    text
                ))),
            }
        }
        other => Err(HubError::Upstream(format!(
            "unexpected sensor value {}",
            other
        ))),
    }
}

/// One IoT cloud API
///
/// Slots are Blynk virtual pin numbers or ThingSpeak field indices.
#[async_trait::async_trait]
pub trait SensorProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Slot a sensor is read from
    fn sensor_slot(&self, sensor: Sensor) -> u8;

    /// Slot the water pump is driven through
    fn pump_slot(&self) -> u8;

    /// Read the latest raw value of one slot
    async fn fetch_field(&self, channel: Channel, slot: u8) -> Result<Value>;

    /// Write one slot; returns the provider's acknowledgement body
    async fn set_field(&self, channel: Channel, slot: u8, value: &str) -> Result<String>;
}

/// Dashboard-facing gateway over a provider
pub struct SensorGateway {
    provider: Arc<dyn SensorProvider>,
}

impl SensorGateway {
    pub fn new(provider: Arc<dyn SensorProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Fetch and validate one sensor reading
    pub async fn read(&self, sensor: Sensor) -> Result<Reading> {
        let slot = self.provider.sensor_slot(sensor);
        let raw = self.provider.fetch_field(sensor.channel(), slot).await?;

        debug!(sensor = sensor.key(), slot, value = %raw, "Fetched sensor value");

        validate_reading(raw).inspect_err(|e| {
            warn!(sensor = sensor.key(), error = %e, "Rejected sensor value");
        })
    }

    /// Switch the water pump; the write is not read back
    pub async fn set_pump(&self, state: PumpState) -> Result<String> {
        let slot = self.provider.pump_slot();
        let value = state.pin_value().to_string();
        self.provider
            .set_field(Channel::PlantWatering, slot, &value)
            .await
    }
}

/// Shared HTTP client for provider calls
pub fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| HubError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// GET a provider URL and return the body text, failing on non-2xx
pub(crate) async fn get_text(client: &reqwest::Client, url: reqwest::Url) -> Result<String> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| HubError::Upstream(format!("request to {} failed: {}", url.path(), e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(HubError::Upstream(format!(
            "{} returned {}",
            url.path(),
            status
        )));
    }

    response
        .text()
        .await
        .map_err(|e| HubError::Upstream(format!("failed to read body from {}: {}", url.path(), e)))
}

/// Join a base URL and a path
pub(crate) fn endpoint(base_url: &str, path: &str) -> Result<reqwest::Url> {
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
    reqwest::Url::parse(&raw)
        .map_err(|e| HubError::Config(format!("Invalid provider URL '{}': {}", raw, e)))
}
