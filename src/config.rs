//! Configuration for homesense
//!
//! CLI arguments and environment variable handling using clap. Every flag can
//! also be set from the environment (a `.env` file is loaded first by `main`).

use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};

/// homesense - home IoT dashboard backend
#[derive(Parser, Debug, Clone)]
#[command(name = "homesense")]
#[command(about = "User authentication and IoT sensor pass-through for a home dashboard")]
pub struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind_addr: IpAddr,

    /// Keep running with an in-memory user store if MongoDB is unreachable
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGO_URI", default_value = "mongodb://localhost:27017")]
    pub mongo_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGO_DB", default_value = "homesense")]
    pub mongo_db: String,

    /// How stored passwords are compared
    #[arg(long, env = "PASSWORD_POLICY", value_enum, default_value_t = PasswordPolicy::Argon2)]
    pub password_policy: PasswordPolicy,

    /// Which IoT cloud the sensor endpoints talk to
    #[arg(long, env = "IOT_PROVIDER", value_enum, default_value_t = Provider::Blynk)]
    pub provider: Provider,

    /// Blynk configuration
    #[command(flatten)]
    pub blynk: BlynkArgs,

    /// ThingSpeak configuration
    #[command(flatten)]
    pub thingspeak: ThingSpeakArgs,

    /// Timeout for IoT cloud requests in milliseconds (client default when unset)
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS")]
    pub upstream_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Password comparison policy
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordPolicy {
    /// Argon2id PHC hashes
    Argon2,
    /// Byte-exact comparison against the stored string
    Plaintext,
}

/// IoT cloud provider
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Blynk,
    #[value(name = "thingspeak")]
    ThingSpeak,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blynk => "blynk",
            Self::ThingSpeak => "thingspeak",
        }
    }
}

/// Blynk connection configuration
#[derive(Parser, Debug, Clone)]
pub struct BlynkArgs {
    /// Blynk cloud base URL
    #[arg(long, env = "BLYNK_BASE_URL", default_value = "http://blynk.cloud")]
    pub blynk_base_url: String,

    /// Auth token of the plant watering device
    #[arg(long, env = "PLANT_WATERING_AUTH_TOKEN")]
    pub plant_watering_auth_token: Option<String>,

    /// Auth token of the gas/temperature/humidity device
    #[arg(long, env = "GAS_TEMPERATURE_HUMIDITY_AUTH_TOKEN")]
    pub gas_temperature_humidity_auth_token: Option<String>,
}

/// ThingSpeak connection configuration
///
/// Two channels: the legacy plant watering channel and the current
/// environment channel.
#[derive(Parser, Debug, Clone)]
pub struct ThingSpeakArgs {
    /// ThingSpeak API base URL
    #[arg(long, env = "THINGSPEAK_BASE_URL", default_value = "https://api.thingspeak.com")]
    pub thingspeak_base_url: String,

    #[arg(long, env = "THINGSPEAK_PLANT_CHANNEL_ID")]
    pub thingspeak_plant_channel_id: Option<String>,

    #[arg(long, env = "THINGSPEAK_PLANT_READ_KEY")]
    pub thingspeak_plant_read_key: Option<String>,

    #[arg(long, env = "THINGSPEAK_PLANT_WRITE_KEY")]
    pub thingspeak_plant_write_key: Option<String>,

    #[arg(long, env = "THINGSPEAK_ENV_CHANNEL_ID")]
    pub thingspeak_env_channel_id: Option<String>,

    #[arg(long, env = "THINGSPEAK_ENV_READ_KEY")]
    pub thingspeak_env_read_key: Option<String>,

    #[arg(long, env = "THINGSPEAK_ENV_WRITE_KEY")]
    pub thingspeak_env_write_key: Option<String>,
}

impl Args {
    /// Socket address to listen on
    pub fn listen(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Names of required keys that are missing for the selected provider
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let required: Vec<(&'static str, &Option<String>)> = match self.provider {
            Provider::Blynk => vec![
                ("PLANT_WATERING_AUTH_TOKEN", &self.blynk.plant_watering_auth_token),
                (
                    "GAS_TEMPERATURE_HUMIDITY_AUTH_TOKEN",
                    &self.blynk.gas_temperature_humidity_auth_token,
                ),
            ],
            Provider::ThingSpeak => vec![
                ("THINGSPEAK_PLANT_CHANNEL_ID", &self.thingspeak.thingspeak_plant_channel_id),
                ("THINGSPEAK_PLANT_READ_KEY", &self.thingspeak.thingspeak_plant_read_key),
                ("THINGSPEAK_PLANT_WRITE_KEY", &self.thingspeak.thingspeak_plant_write_key),
                ("THINGSPEAK_ENV_CHANNEL_ID", &self.thingspeak.thingspeak_env_channel_id),
                ("THINGSPEAK_ENV_READ_KEY", &self.thingspeak.thingspeak_env_read_key),
                ("THINGSPEAK_ENV_WRITE_KEY", &self.thingspeak.thingspeak_env_write_key),
            ],
        };

        required
            .into_iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| name)
            .collect()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let missing = self.missing_keys();
        if !missing.is_empty() {
            return Err(format!(
                "{} provider requires: {}",
                self.provider.as_str(),
                missing.join(", ")
            ));
        }

        if self.mongo_uri.trim().is_empty() {
            return Err("MONGO_URI must not be empty".to_string());
        }

        if self.upstream_timeout_ms == Some(0) {
            return Err("UPSTREAM_TIMEOUT_MS must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["homesense"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_blynk_requires_both_tokens() {
        let args = parse(&[
            "--provider",
            "blynk",
            "--plant-watering-auth-token",
            "plant",
            "--gas-temperature-humidity-auth-token",
            "",
        ]);
        let err = args.validate().unwrap_err();
        assert!(err.contains("GAS_TEMPERATURE_HUMIDITY_AUTH_TOKEN"));
        assert!(!err.contains("PLANT_WATERING_AUTH_TOKEN"));
    }

    #[test]
    fn test_thingspeak_lists_every_missing_key() {
        let args = parse(&[
            "--provider",
            "thingspeak",
            "--thingspeak-plant-channel-id",
            "1",
            "--thingspeak-plant-read-key",
            "r",
            "--thingspeak-plant-write-key",
            "w",
            "--thingspeak-env-channel-id",
            "",
            "--thingspeak-env-read-key",
            "",
            "--thingspeak-env-write-key",
            "",
        ]);
        assert_eq!(
            args.missing_keys(),
            vec![
                "THINGSPEAK_ENV_CHANNEL_ID",
                "THINGSPEAK_ENV_READ_KEY",
                "THINGSPEAK_ENV_WRITE_KEY"
            ]
        );
    }

    #[test]
    fn test_complete_thingspeak_config_is_valid() {
        let args = parse(&[
            "--provider",
            "thingspeak",
            "--port",
            "4000",
            "--thingspeak-plant-channel-id",
            "1",
            "--thingspeak-plant-read-key",
            "r1",
            "--thingspeak-plant-write-key",
            "w1",
            "--thingspeak-env-channel-id",
            "2",
            "--thingspeak-env-read-key",
            "r2",
            "--thingspeak-env-write-key",
            "w2",
        ]);
        assert!(args.validate().is_ok());
        assert_eq!(args.listen().port(), 4000);
        assert_eq!(args.provider, Provider::ThingSpeak);
    }

    #[test]
    fn test_password_policy_values() {
        let args = parse(&["--password-policy", "plaintext"]);
        assert_eq!(args.password_policy, PasswordPolicy::Plaintext);
    }

    #[test]
    fn test_zero_upstream_timeout_is_rejected() {
        let base = [
            "--plant-watering-auth-token",
            "plant",
            "--gas-temperature-humidity-auth-token",
            "env",
        ];

        let mut argv = base.to_vec();
        argv.extend_from_slice(&["--upstream-timeout-ms", "0"]);
        let err = parse(&argv).validate().unwrap_err();
        assert!(err.contains("UPSTREAM_TIMEOUT_MS"));

        let mut argv = base.to_vec();
        argv.extend_from_slice(&["--upstream-timeout-ms", "2500"]);
        assert!(parse(&argv).validate().is_ok());
    }
}
