//! Pub/sub client façade
//!
//! `PubsubClient` composes the registry, the message ID allocator, the
//! request sender, one delivery loop per topic and the heartbeat scheduler.
//!
//! Lifecycle:
//! - `new`/`connect` seed the allocator and start the heartbeat task. Server
//!   reachability is not checked here; the first `add_sub` finds out.
//! - `add_sub` returns the existing channel for a registered topic without
//!   touching the network. Otherwise it sends ADDSUB, registers the entry and
//!   starts the topic's delivery loop.
//! - `remove_sub` is a no-op for unknown topics. Otherwise it sends REMSUB,
//!   removes the entry and cancels the loop, which releases the connection.
//! - `shutdown` (or dropping the client) stops the heartbeat and every loop.
//!
//! `add_sub` and `remove_sub` are serialized against each other so two
//! concurrent calls for one topic cannot both reach the server.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use crate::client::delivery::DeliveryLoop;
use crate::client::heartbeat::HeartbeatScheduler;
use crate::client::message_id::MessageIdAllocator;
use crate::client::registry::{SubscriptionEntry, SubscriptionRegistry};
use crate::client::request::RequestSender;
use crate::client::subscription::Subscription;
use crate::config::ClientConfig;
use crate::transport::{Command, Dialer, UdpDialer, topic_path};
use crate::utils::error::{PubsubError, Result};

pub struct PubsubClient {
    config: ClientConfig,
    registry: SubscriptionRegistry,
    ids: Arc<MessageIdAllocator>,
    requests: RequestSender,
    control: Arc<Mutex<()>>,
    shutdown_tx: watch::Sender<bool>,
    heartbeat: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl PubsubClient {
    /// Client over UDP with default settings. Must be called from within a
    /// Tokio runtime.
    pub fn connect(server_addr: impl Into<String>) -> Self {
        Self::new(ClientConfig::new(server_addr))
    }

    /// Client over UDP. Must be called from within a Tokio runtime.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_dialer(config, Arc::new(UdpDialer))
    }

    /// Client over any transport. Must be called from within a Tokio runtime.
    pub fn with_dialer(config: ClientConfig, dialer: Arc<dyn Dialer>) -> Self {
        Self::with_parts(
            config,
            dialer,
            Arc::new(MessageIdAllocator::seeded()),
            SubscriptionRegistry::new(),
        )
    }

    /// Client with an injected allocator and registry.
    pub fn with_parts(
        config: ClientConfig,
        dialer: Arc<dyn Dialer>,
        ids: Arc<MessageIdAllocator>,
        registry: SubscriptionRegistry,
    ) -> Self {
        let requests = RequestSender::new(config.server_addr.clone(), dialer, Arc::clone(&ids));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let heartbeat = HeartbeatScheduler::new(
            registry.clone(),
            Arc::clone(&ids),
            config.heartbeat_interval,
            config.heartbeat_payload.clone(),
            config.heartbeat_ids,
        )
        .spawn(shutdown_rx);

        info!("Pub/sub client created for {}", config.server_addr);

        Self {
            config,
            registry,
            ids,
            requests,
            control: Arc::new(Mutex::new(())),
            shutdown_tx,
            heartbeat: std::sync::Mutex::new(Some(heartbeat)),
        }
    }

    /// Subscribe to `topic` and return its delivery channel.
    ///
    /// Topics are keyed by their path form, so `"/a/b"` and `"a/b"` share
    /// one subscription.
    pub async fn add_sub(&self, topic: &str) -> Result<Subscription> {
        let topic = topic_path(topic);
        let topic = topic.as_str();
        let _guard = self.control.lock().await;
        if self.is_shut_down() {
            return Err(PubsubError::Shutdown);
        }

        if let Some(existing) = self.registry.subscription(topic) {
            // already subscribed: no request to the server
            debug!("Topic {} already subscribed", topic);
            return Ok(existing);
        }

        let connection = self.requests.send_request(Command::AddSub, topic).await?;

        let (sender, subscription) = Subscription::channel(topic, self.config.channel_capacity);
        let (entry, cancelled) =
            SubscriptionEntry::new(topic, subscription.clone(), Arc::clone(&connection));
        let entry_id = entry.id;
        self.registry.insert(entry);

        DeliveryLoop {
            topic: topic.to_string(),
            entry_id,
            connection,
            sender,
            registry: self.registry.clone(),
            cancelled,
            poll_interval: self.config.poll_interval,
            max_receive_errors: self.config.max_receive_errors,
            ack_confirmable: self.config.ack_confirmable,
            requests: self.requests.clone(),
            control: Arc::clone(&self.control),
        }
        .spawn();

        info!("Subscribed to {}", topic);
        Ok(subscription)
    }

    /// Unsubscribe from `topic`.
    ///
    /// If the REMSUB request cannot be sent the topic stays subscribed and
    /// the error is returned.
    pub async fn remove_sub(&self, topic: &str) -> Result<()> {
        let topic = topic_path(topic);
        let topic = topic.as_str();
        let _guard = self.control.lock().await;

        if !self.registry.contains(topic) {
            // not in sub list: nothing to tell the server
            return Ok(());
        }

        let connection = self.requests.send_request(Command::RemSub, topic).await?;
        connection.close().await;

        if let Some(entry) = self.registry.remove(topic) {
            entry.cancel();
        }

        info!("Unsubscribed from {}", topic);
        Ok(())
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.registry.contains(&topic_path(topic))
    }

    /// Subscribed topics, sorted.
    pub fn topics(&self) -> Vec<String> {
        self.registry.topics()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn server_addr(&self) -> &str {
        self.requests.server_addr()
    }

    /// Last message ID handed out.
    pub fn last_message_id(&self) -> u16 {
        self.ids.current()
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Stop the heartbeat task and every delivery loop.
    ///
    /// Subscriptions are dropped locally without sending REMSUB; call
    /// `remove_sub` first to tell the server.
    pub async fn shutdown(&self) {
        let _guard = self.control.lock().await;
        self.stop();

        let handle = self
            .heartbeat
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        info!("Pub/sub client shut down");
    }

    fn stop(&self) {
        self.shutdown_tx.send_replace(true);
        for entry in self.registry.drain() {
            entry.cancel();
        }
    }
}

impl Drop for PubsubClient {
    fn drop(&mut self) {
        self.stop();
    }
}
