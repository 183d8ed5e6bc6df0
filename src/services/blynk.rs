//! Blynk cloud provider
//!
//! Each device is addressed by its auth token; values live on virtual pins.
//!
//! - read:  `GET {base}/external/api/get?token={token}&V{pin}`
//! - write: `GET {base}/external/api/update?token={token}&V{pin}={value}`

use serde_json::Value;
use tracing::debug;

use crate::config::BlynkArgs;
use crate::services::gateway::{endpoint, get_text, Channel, Sensor, SensorProvider};
use crate::types::{HubError, Result};

/// Auth tokens, one per device
#[derive(Debug, Clone)]
pub struct BlynkTokens {
    pub plant_watering: String,
    pub environment: String,
}

pub struct BlynkProvider {
    client: reqwest::Client,
    base_url: String,
    tokens: BlynkTokens,
}

impl BlynkProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, tokens: BlynkTokens) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            tokens,
        }
    }

    /// Build from CLI/env configuration
    pub fn from_args(args: &BlynkArgs, client: reqwest::Client) -> Result<Self> {
        let plant_watering = args
            .plant_watering_auth_token
            .clone()
            .ok_or_else(|| HubError::Config("PLANT_WATERING_AUTH_TOKEN is not set".into()))?;
        let environment = args
            .gas_temperature_humidity_auth_token
            .clone()
            .ok_or_else(|| {
                HubError::Config("GAS_TEMPERATURE_HUMIDITY_AUTH_TOKEN is not set".into())
            })?;

        Ok(Self::new(
            client,
            args.blynk_base_url.clone(),
            BlynkTokens {
                plant_watering,
                environment,
            },
        ))
    }

    fn token(&self, channel: Channel) -> &str {
        match channel {
            Channel::PlantWatering => &self.tokens.plant_watering,
            Channel::Environment => &self.tokens.environment,
        }
    }

    /// URL reading one virtual pin
    pub fn read_url(&self, channel: Channel, pin: u8) -> Result<reqwest::Url> {
        let mut url = endpoint(&self.base_url, "/external/api/get")?;
        url.query_pairs_mut()
            .append_pair("token", self.token(channel))
            .append_key_only(&format!("V{}", pin));
        Ok(url)
    }

    /// URL writing one virtual pin
    pub fn write_url(&self, channel: Channel, pin: u8, value: &str) -> Result<reqwest::Url> {
        let mut url = endpoint(&self.base_url, "/external/api/update")?;
        url.query_pairs_mut()
            .append_pair("token", self.token(channel))
            .append_pair(&format!("V{}", pin), value);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl SensorProvider for BlynkProvider {
    fn name(&self) -> &'static str {
        "blynk"
    }

    fn sensor_slot(&self, sensor: Sensor) -> u8 {
        match sensor {
            Sensor::Moisture => 0,
            Sensor::Gas => 2,
            Sensor::Temperature => 3,
            Sensor::Humidity => 4,
            Sensor::Flame => 5,
        }
    }

    fn pump_slot(&self) -> u8 {
        1
    }

    async fn fetch_field(&self, channel: Channel, pin: u8) -> Result<Value> {
        let body = get_text(&self.client, self.read_url(channel, pin)?).await?;

        // The pin value comes back bare; numbers decode as JSON, text stays text
        let value = serde_json::from_str::<Value>(body.trim())
            .unwrap_or_else(|_| Value::String(body.trim().to_string()));

        debug!(pin, value = %value, "Blynk pin read");
        Ok(value)
    }

    async fn set_field(&self, channel: Channel, pin: u8, value: &str) -> Result<String> {
        let body = get_text(&self.client, self.write_url(channel, pin, value)?).await?;
        debug!(pin, value, "Blynk pin updated");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gateway::{PumpState, SensorGateway};
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Arc;

    fn provider(base_url: &str) -> BlynkProvider {
        BlynkProvider::new(
            reqwest::Client::new(),
            base_url,
            BlynkTokens {
                plant_watering: "plant-token".into(),
                environment: "env-token".into(),
            },
        )
    }

    #[test]
    fn test_urls() {
        let p = provider("http://blynk.cloud");
        assert_eq!(
            p.read_url(Channel::PlantWatering, 0).unwrap().as_str(),
            "http://blynk.cloud/external/api/get?token=plant-token&V0"
        );
        assert_eq!(
            p.write_url(Channel::PlantWatering, 1, "1").unwrap().as_str(),
            "http://blynk.cloud/external/api/update?token=plant-token&V1=1"
        );
        assert_eq!(
            p.read_url(Channel::Environment, 3).unwrap().as_str(),
            "http://blynk.cloud/external/api/get?token=env-token&V3"
        );
    }

    #[tokio::test]
    async fn test_read_temperature() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/external/api/get")
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("token=env-token".into()),
                Matcher::Regex("V3".into()),
            ]))
            .with_body("21.5")
            .expect(1)
            .create_async()
            .await;

        let gateway = SensorGateway::new(Arc::new(provider(&server.url())));
        let reading = gateway.read(Sensor::Temperature).await.unwrap();
        assert_eq!(reading.value(), &json!(21.5));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_rejects_text_value() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/external/api/get")
            .match_query(Matcher::Any)
            .with_body("offline")
            .create_async()
            .await;

        let gateway = SensorGateway::new(Arc::new(provider(&server.url())));
        let err = gateway.read(Sensor::Gas).await.unwrap_err();
        assert!(matches!(err, HubError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_invalid_token_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/external/api/get")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":{"message":"Invalid token."}}"#)
            .create_async()
            .await;

        let gateway = SensorGateway::new(Arc::new(provider(&server.url())));
        let err = gateway.read(Sensor::Moisture).await.unwrap_err();
        assert!(matches!(err, HubError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_pump_on_writes_one() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/external/api/update")
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("token=plant-token".into()),
                Matcher::Regex("V1=1".into()),
            ]))
            .with_body("")
            .expect(1)
            .create_async()
            .await;

        let gateway = SensorGateway::new(Arc::new(provider(&server.url())));
        gateway.set_pump(PumpState::On).await.unwrap();

        mock.assert_async().await;
    }
}
