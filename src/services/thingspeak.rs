//! ThingSpeak provider
//!
//! Each channel has its own id plus read and write API keys. Two channels are
//! configured: the legacy plant watering channel and the current environment
//! channel.
//!
//! - read:  `GET {base}/channels/{id}/fields/{n}.json?api_key={read_key}&results=1`
//! - write: `GET {base}/update?api_key={write_key}&field{n}={value}`
//!
//! A read answers with `{"channel": {...}, "feeds": [{"field{n}": "23.5", ...}]}`.
//! A write answers with the new entry id, or `0` when ThingSpeak dropped the
//! update (rate limit).

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ThingSpeakArgs;
use crate::services::gateway::{endpoint, get_text, Channel, Sensor, SensorProvider};
use crate::types::{HubError, Result};

/// Channel id and API keys
#[derive(Debug, Clone)]
pub struct ChannelDescriptor {
    pub id: String,
    pub read_key: String,
    pub write_key: String,
}

#[derive(Debug, Clone)]
pub struct ThingSpeakChannels {
    pub plant_watering: ChannelDescriptor,
    pub environment: ChannelDescriptor,
}

pub struct ThingSpeakProvider {
    client: reqwest::Client,
    base_url: String,
    channels: ThingSpeakChannels,
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    value
        .clone()
        .ok_or_else(|| HubError::Config(format!("{} is not set", name)))
}

impl ThingSpeakProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        channels: ThingSpeakChannels,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            channels,
        }
    }

    /// Build from CLI/env configuration
    pub fn from_args(args: &ThingSpeakArgs, client: reqwest::Client) -> Result<Self> {
        let plant_watering = ChannelDescriptor {
            id: required(&args.thingspeak_plant_channel_id, "THINGSPEAK_PLANT_CHANNEL_ID")?,
            read_key: required(&args.thingspeak_plant_read_key, "THINGSPEAK_PLANT_READ_KEY")?,
            write_key: required(&args.thingspeak_plant_write_key, "THINGSPEAK_PLANT_WRITE_KEY")?,
        };
        let environment = ChannelDescriptor {
            id: required(&args.thingspeak_env_channel_id, "THINGSPEAK_ENV_CHANNEL_ID")?,
            read_key: required(&args.thingspeak_env_read_key, "THINGSPEAK_ENV_READ_KEY")?,
            write_key: required(&args.thingspeak_env_write_key, "THINGSPEAK_ENV_WRITE_KEY")?,
        };

        Ok(Self::new(
            client,
            args.thingspeak_base_url.clone(),
            ThingSpeakChannels {
                plant_watering,
                environment,
            },
        ))
    }

    fn channel(&self, channel: Channel) -> &ChannelDescriptor {
        match channel {
            Channel::PlantWatering => &self.channels.plant_watering,
            Channel::Environment => &self.channels.environment,
        }
    }

    /// URL returning the latest entry of one field
    pub fn read_url(&self, channel: Channel, field: u8) -> Result<reqwest::Url> {
        let descriptor = self.channel(channel);
        let mut url = endpoint(
            &self.base_url,
            &format!("/channels/{}/fields/{}.json", descriptor.id, field),
        )?;
        url.query_pairs_mut()
            .append_pair("api_key", &descriptor.read_key)
            .append_pair("results", "1");
        Ok(url)
    }

    /// URL writing one field
    pub fn write_url(&self, channel: Channel, field: u8, value: &str) -> Result<reqwest::Url> {
        let descriptor = self.channel(channel);
        let mut url = endpoint(&self.base_url, "/update")?;
        url.query_pairs_mut()
            .append_pair("api_key", &descriptor.write_key)
            .append_pair(&format!("field{}", field), value);
        Ok(url)
    }
}

/// Pull `field{n}` out of the most recent feed entry
pub fn extract_field(payload: &Value, field: u8) -> Result<Value> {
    let key = format!("field{}", field);

    let feeds = payload
        .get("feeds")
        .and_then(Value::as_array)
        .ok_or_else(|| HubError::Upstream("response has no feeds".to_string()))?;

    let latest = feeds
        .last()
        .ok_or_else(|| HubError::Upstream("channel has no entries".to_string()))?;

    latest
        .get(&key)
        .cloned()
        .ok_or_else(|| HubError::Upstream(format!("latest entry has no {}", key)))
}

#[async_trait::async_trait]
impl SensorProvider for ThingSpeakProvider {
    fn name(&self) -> &'static str {
        "thingspeak"
    }

    fn sensor_slot(&self, sensor: Sensor) -> u8 {
        match sensor {
            Sensor::Moisture => 1,
            Sensor::Temperature => 1,
            Sensor::Humidity => 2,
            Sensor::Gas => 3,
            Sensor::Flame => 4,
        }
    }

    fn pump_slot(&self) -> u8 {
        2
    }

    async fn fetch_field(&self, channel: Channel, field: u8) -> Result<Value> {
        let body = get_text(&self.client, self.read_url(channel, field)?).await?;
        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| HubError::Upstream(format!("invalid ThingSpeak JSON: {}", e)))?;

        let value = extract_field(&payload, field)?;
        debug!(channel = %self.channel(channel).id, field, value = %value, "ThingSpeak field read");
        Ok(value)
    }

    async fn set_field(&self, channel: Channel, field: u8, value: &str) -> Result<String> {
        let body = get_text(&self.client, self.write_url(channel, field, value)?).await?;
        let entry_id = body.trim().to_string();

        if entry_id == "0" {
            warn!(
                channel = %self.channel(channel).id,
                field,
                "ThingSpeak did not record the update (rate limited?)"
            );
        }

        Ok(entry_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gateway::{PumpState, SensorGateway};
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Arc;

    fn provider(base_url: &str) -> ThingSpeakProvider {
        ThingSpeakProvider::new(
            reqwest::Client::new(),
            base_url,
            ThingSpeakChannels {
                plant_watering: ChannelDescriptor {
                    id: "1001".into(),
                    read_key: "PLANTREAD".into(),
                    write_key: "PLANTWRITE".into(),
                },
                environment: ChannelDescriptor {
                    id: "2002".into(),
                    read_key: "ENVREAD".into(),
                    write_key: "ENVWRITE".into(),
                },
            },
        )
    }

    #[test]
    fn test_urls() {
        let p = provider("https://api.thingspeak.com");
        assert_eq!(
            p.read_url(Channel::Environment, 1).unwrap().as_str(),
            "https://api.thingspeak.com/channels/2002/fields/1.json?api_key=ENVREAD&results=1"
        );
        assert_eq!(
            p.write_url(Channel::PlantWatering, 2, "0").unwrap().as_str(),
            "https://api.thingspeak.com/update?api_key=PLANTWRITE&field2=0"
        );
    }

    #[test]
    fn test_extract_field() {
        let payload = json!({
            "channel": {"id": 2002},
            "feeds": [
                {"entry_id": 1, "field1": "19.0"},
                {"entry_id": 2, "field1": "23.5"}
            ]
        });
        assert_eq!(extract_field(&payload, 1).unwrap(), json!("23.5"));
        assert!(matches!(extract_field(&payload, 2), Err(HubError::Upstream(_))));
        assert!(matches!(
            extract_field(&json!({"feeds": []}), 1),
            Err(HubError::Upstream(_))
        ));
        assert!(matches!(extract_field(&json!(-1), 1), Err(HubError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_read_temperature() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/channels/2002/fields/1.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("api_key".into(), "ENVREAD".into()),
                Matcher::UrlEncoded("results".into(), "1".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(r#"{"channel":{"id":2002},"feeds":[{"entry_id":7,"field1":"23.5"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let gateway = SensorGateway::new(Arc::new(provider(&server.url())));
        let reading = gateway.read(Sensor::Temperature).await.unwrap();
        assert_eq!(reading.value(), &json!("23.5"));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_nan_reading_fails() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/channels/2002/fields/4.json")
            .match_query(Matcher::Any)
            .with_body(r#"{"feeds":[{"field4":"nan"}]}"#)
            .create_async()
            .await;

        let gateway = SensorGateway::new(Arc::new(provider(&server.url())));
        let err = gateway.read(Sensor::Flame).await.unwrap_err();
        assert!(matches!(err, HubError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_pump_off_writes_zero() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/update")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("api_key".into(), "PLANTWRITE".into()),
                Matcher::UrlEncoded("field2".into(), "0".into()),
            ]))
            .with_body("42")
            .expect(1)
            .create_async()
            .await;

        let gateway = SensorGateway::new(Arc::new(provider(&server.url())));
        let ack = gateway.set_pump(PumpState::Off).await.unwrap();
        assert_eq!(ack, "42");

        mock.assert_async().await;
    }
}
