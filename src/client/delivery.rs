//! Per-topic delivery loop
//!
//! One task per active subscription. It parks in `receive` on the topic's
//! connection, forwards each publication into the topic's channel, pauses,
//! and then checks that its registry entry is still current. Removal also
//! fires a cancellation signal, so the loop stops right away from any of its
//! suspension points instead of waiting for the next liveness check.
//!
//! A receive that never returns keeps the loop parked until the topic is
//! removed or the client shuts down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, warn};

use crate::client::registry::{EntryId, SubscriptionRegistry};
use crate::client::request::RequestSender;
use crate::transport::{CoapMessage, Command, Connection, MessageType};

/// Why a delivery loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The topic is no longer registered under this loop's entry.
    Removed,
    /// The cancellation signal fired.
    Cancelled,
    /// The consecutive receive failure limit was reached.
    ReceiveErrors,
}

pub struct DeliveryLoop {
    pub(crate) topic: String,
    pub(crate) entry_id: EntryId,
    pub(crate) connection: Arc<dyn Connection>,
    pub(crate) sender: mpsc::Sender<String>,
    pub(crate) registry: SubscriptionRegistry,
    pub(crate) cancelled: watch::Receiver<bool>,
    pub(crate) poll_interval: Duration,
    pub(crate) max_receive_errors: Option<u32>,
    pub(crate) ack_confirmable: bool,
    /// Used to unsubscribe on the server when the loop gives up.
    pub(crate) requests: RequestSender,
    /// Held while unsubscribing so it cannot interleave with `add_sub`.
    pub(crate) control: Arc<Mutex<()>>,
}

impl DeliveryLoop {
    pub fn spawn(self) -> tokio::task::JoinHandle<LoopExit> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) -> LoopExit {
        debug!("Delivery loop started for topic {}", self.topic);
        let exit = self.drive().await;
        if exit == LoopExit::ReceiveErrors {
            self.give_up().await;
        }
        self.connection.close().await;
        info!("Loop topic: {} stopped ({:?}), leaving loop", self.topic, exit);
        exit
    }

    async fn drive(&mut self) -> LoopExit {
        let mut consecutive_errors: u32 = 0;

        loop {
            if *self.cancelled.borrow() {
                return LoopExit::Cancelled;
            }

            let received = tokio::select! {
                biased;
                _ = self.cancelled.changed() => return LoopExit::Cancelled,
                received = self.connection.receive() => received,
            };

            match received {
                Ok(message) => {
                    consecutive_errors = 0;
                    if !self.handle(message).await {
                        return LoopExit::Cancelled;
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;
                    warn!(
                        "Error receiving on topic {} ({} in a row): {}",
                        self.topic, consecutive_errors, e
                    );
                    if self
                        .max_receive_errors
                        .is_some_and(|max| consecutive_errors >= max)
                    {
                        return LoopExit::ReceiveErrors;
                    }
                }
            }

            tokio::select! {
                biased;
                _ = self.cancelled.changed() => return LoopExit::Cancelled,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            if !self.registry.is_current(&self.topic, self.entry_id) {
                return LoopExit::Removed;
            }
        }
    }

    /// Leave the registry so the topic can be subscribed again, and tell the
    /// server. The REMSUB is best effort; a failure is only logged.
    async fn give_up(&self) {
        let _guard = self.control.lock().await;
        if self
            .registry
            .remove_if_current(&self.topic, self.entry_id)
            .is_none()
        {
            return;
        }
        match self.requests.send_request(Command::RemSub, &self.topic).await {
            Ok(connection) => connection.close().await,
            Err(e) => warn!("Could not unsubscribe {} after receive errors: {}", self.topic, e),
        }
    }

    /// Acknowledge and forward one inbound message. Returns false if the
    /// loop was cancelled while waiting for channel capacity.
    async fn handle(&mut self, message: CoapMessage) -> bool {
        if self.ack_confirmable && message.message_type == MessageType::Confirmable {
            if let Err(e) = self.connection.send(&CoapMessage::ack(message.message_id)).await {
                warn!("Failed to acknowledge {} on {}: {}", message.message_id, self.topic, e);
            }
        }

        if message.is_bare_ack() {
            debug!("Ack {} on topic {}", message.message_id, self.topic);
            return true;
        }

        let payload = message.payload_text();
        debug!("Got {} on topic {}", payload, self.topic);

        // Blocks while the subscriber is not reading.
        tokio::select! {
            biased;
            _ = self.cancelled.changed() => false,
            sent = self.sender.send(payload) => {
                if sent.is_err() {
                    debug!("Subscriber for {} dropped its channel", self.topic);
                }
                true
            }
        }
    }
}
