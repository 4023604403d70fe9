//! ADDSUB/REMSUB control requests
//!
//! Every control request goes out on a freshly dialed connection. For ADDSUB
//! that connection becomes the topic's long-lived delivery and heartbeat
//! channel: the server answers subscriptions on the request's own response
//! path instead of a separate notify connection.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::message_id::MessageIdAllocator;
use crate::transport::{CoapMessage, Command, Connection, Dialer};
use crate::utils::error::Result;

#[derive(Clone)]
pub struct RequestSender {
    server_addr: String,
    dialer: Arc<dyn Dialer>,
    ids: Arc<MessageIdAllocator>,
}

impl RequestSender {
    pub fn new(server_addr: String, dialer: Arc<dyn Dialer>, ids: Arc<MessageIdAllocator>) -> Self {
        Self {
            server_addr,
            dialer,
            ids,
        }
    }

    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Dial the server and send `command` for `topic`.
    ///
    /// Returns the connection the request went out on. A dial failure is a
    /// `Connection` error and nothing was sent. A send failure closes the
    /// connection and is returned as a `Transport` error.
    pub async fn send_request(&self, command: Command, topic: &str) -> Result<Arc<dyn Connection>> {
        let request = CoapMessage::request(command, topic, self.ids.next());

        let connection = self.dialer.dial(&self.server_addr).await.map_err(|e| {
            warn!("{} >> Error dialing {}: {}", command, self.server_addr, e);
            e
        })?;

        if let Err(e) = connection.send(&request).await {
            warn!("{} >> Error sending request for {}: {}", command, topic, e);
            connection.close().await;
            return Err(e);
        }

        debug!(
            "{} sent for topic {} (msgID={})",
            command, topic, request.message_id
        );
        Ok(connection)
    }
}
