//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `coap_pubsub` crate.
//!
//! It centralizes the error type shared by the transport and client layers
//! and the tracing bootstrap used by the binary and the tests.

pub mod error;
pub mod logging;

pub use error::{PubsubError, Result};

#[cfg(test)]
mod tests {
    use super::logging;
    use super::PubsubError;

    #[test]
    fn logging_init_accepts_levels() {
        // Should not panic
        logging::init("info");
        logging::init("debug");
        logging::init("warn");
        logging::init("nonsense");
    }

    #[test]
    fn connection_error_reads_as_dial_failure() {
        let err = PubsubError::connection("connection refused");
        assert_eq!(err.to_string(), "Dial failed: connection refused");
    }

    #[test]
    fn heartbeat_error_names_topic() {
        let err = PubsubError::HeartbeatSend {
            topic: "sensors/temp".to_string(),
            reason: "socket closed".to_string(),
        };
        assert!(err.to_string().contains("sensors/temp"));
        assert!(err.to_string().contains("socket closed"));
    }
}
