//! Transport seam between the client core and the network.
//!
//! The client only ever dials a server address and then sends and receives
//! whole CoAP messages on the resulting connection. Keeping that behind two
//! traits lets the core run against UDP in production and an in-memory
//! connection in tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::transport::message::CoapMessage;
use crate::utils::error::Result;

/// One logical conversation with the server.
///
/// Implementations must tolerate `send` and `receive` being called
/// concurrently from different tasks: the delivery loop parks in `receive`
/// while the heartbeat scheduler sends on the same connection.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Hand one message to the network. Best effort.
    async fn send(&self, message: &CoapMessage) -> Result<()>;

    /// Wait for the next inbound message. Blocks the calling task until one
    /// arrives; there is no timeout.
    async fn receive(&self) -> Result<CoapMessage>;

    /// Release the connection. Further sends fail.
    async fn close(&self) {}
}

/// Opens connections to a server address.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, address: &str) -> Result<Arc<dyn Connection>>;
}
