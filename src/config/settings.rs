use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes the client settings, logging and the topics the binary
/// subscribes to on startup.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub client: ClientSettings,
    pub logging: LoggingSettings,
    pub topics: Vec<String>,
}

/// Configuration settings for the pub/sub client.
#[derive(Debug, Deserialize, Clone)]
pub struct ClientSettings {
    pub server_addr: String,
    pub heartbeat_interval_secs: u64,
    pub heartbeat_payload: String,
    pub heartbeat_ids: HeartbeatIdPolicy,
    pub poll_interval_ms: u64,
    pub channel_capacity: usize,
    /// Consecutive receive failures before a delivery loop gives up,
    /// deregisters the topic and sends a best-effort REMSUB.
    /// `0` keeps the loop running forever.
    pub max_receive_errors: u32,
    pub ack_confirmable: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// How heartbeat message IDs are allocated within one tick.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatIdPolicy {
    /// One fresh ID per tick, shared by every topic's heartbeat.
    #[default]
    Shared,
    /// One fresh ID per topic per tick.
    PerTopic,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub client: Option<PartialClientSettings>,
    pub logging: Option<PartialLoggingSettings>,
    pub topics: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct PartialClientSettings {
    pub server_addr: Option<String>,
    pub heartbeat_interval_secs: Option<u64>,
    pub heartbeat_payload: Option<String>,
    pub heartbeat_ids: Option<HeartbeatIdPolicy>,
    pub poll_interval_ms: Option<u64>,
    pub channel_capacity: Option<usize>,
    pub max_receive_errors: Option<u32>,
    pub ack_confirmable: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client: ClientSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
            },
            topics: Vec::new(),
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:5683".to_string(),
            heartbeat_interval_secs: 60,
            heartbeat_payload: "Heart beat msg.".to_string(),
            heartbeat_ids: HeartbeatIdPolicy::Shared,
            poll_interval_ms: 1000,
            channel_capacity: 64,
            max_receive_errors: 0,
            ack_confirmable: true,
        }
    }
}

impl PartialClientSettings {
    /// Fill every missing value from `default`.
    pub fn merge(self, default: ClientSettings) -> ClientSettings {
        ClientSettings {
            server_addr: self.server_addr.unwrap_or(default.server_addr),
            heartbeat_interval_secs: self
                .heartbeat_interval_secs
                .unwrap_or(default.heartbeat_interval_secs),
            heartbeat_payload: self.heartbeat_payload.unwrap_or(default.heartbeat_payload),
            heartbeat_ids: self.heartbeat_ids.unwrap_or(default.heartbeat_ids),
            poll_interval_ms: self.poll_interval_ms.unwrap_or(default.poll_interval_ms),
            channel_capacity: self.channel_capacity.unwrap_or(default.channel_capacity),
            max_receive_errors: self
                .max_receive_errors
                .unwrap_or(default.max_receive_errors),
            ack_confirmable: self.ack_confirmable.unwrap_or(default.ack_confirmable),
        }
    }
}

/// Runtime view of [`ClientSettings`] consumed by `PubsubClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_addr: String,
    pub heartbeat_interval: Duration,
    pub heartbeat_payload: String,
    pub heartbeat_ids: HeartbeatIdPolicy,
    /// Pause after every receive attempt before the liveness check.
    pub poll_interval: Duration,
    pub channel_capacity: usize,
    pub max_receive_errors: Option<u32>,
    pub ack_confirmable: bool,
}

impl ClientConfig {
    /// Defaults for everything but the server address.
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            ..ClientConfig::from(ClientSettings::default())
        }
    }
}

impl From<ClientSettings> for ClientConfig {
    fn from(s: ClientSettings) -> Self {
        Self {
            server_addr: s.server_addr,
            heartbeat_interval: Duration::from_secs(s.heartbeat_interval_secs),
            heartbeat_payload: s.heartbeat_payload,
            heartbeat_ids: s.heartbeat_ids,
            poll_interval: Duration::from_millis(s.poll_interval_ms),
            // A zero-capacity mpsc channel panics on creation.
            channel_capacity: s.channel_capacity.max(1),
            max_receive_errors: (s.max_receive_errors > 0).then_some(s.max_receive_errors),
            ack_confirmable: s.ack_confirmable,
        }
    }
}
