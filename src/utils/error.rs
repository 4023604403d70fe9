//! Error types for the CoAP pub/sub client.
//!
//! Only `Connection` and `Transport` errors from the ADDSUB/REMSUB control
//! requests reach the application. Receive and heartbeat failures are logged
//! inside their loops and never propagated.

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, PubsubError>;

#[derive(Error, Debug)]
pub enum PubsubError {
    /// Dialing the server failed; the request was not delivered.
    #[error("Dial failed: {0}")]
    Connection(String),

    /// Receiving on an active delivery connection failed.
    #[error("Receive error: {0}")]
    Receive(String),

    /// A heartbeat could not be sent on one topic's connection.
    #[error("Heartbeat send failed on topic {topic}: {reason}")]
    HeartbeatSend { topic: String, reason: String },

    /// A datagram could not be handed to the network.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A CoAP datagram could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The client has been shut down.
    #[error("client is shut down")]
    Shutdown,
}

impl PubsubError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn receive(msg: impl Into<String>) -> Self {
        Self::Receive(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }
}
