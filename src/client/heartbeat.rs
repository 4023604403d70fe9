//! Heartbeat scheduler
//!
//! A single background task keeps every subscription's UDP mapping open by
//! sending an `HB` request over each topic's connection once per interval.
//! Sends within a tick run concurrently and independently: one failing
//! connection is logged and does not hold up or abort the others. There are
//! no retries; the next tick tries again.
//!
//! Every tick allocates a fresh message ID. With `HeartbeatIdPolicy::Shared`
//! that ID is reused for all topics in the tick, which is safe because each
//! topic sends from its own socket and CoAP deduplicates per endpoint.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::message_id::MessageIdAllocator;
use crate::client::registry::SubscriptionRegistry;
use crate::config::HeartbeatIdPolicy;
use crate::transport::CoapMessage;
use crate::utils::error::PubsubError;

/// Outcome of one heartbeat tick.
#[derive(Debug, Default)]
pub struct TickReport {
    pub attempted: usize,
    pub failures: Vec<PubsubError>,
}

impl TickReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }
}

#[derive(Clone)]
pub struct HeartbeatScheduler {
    registry: SubscriptionRegistry,
    ids: Arc<MessageIdAllocator>,
    interval: Duration,
    payload: String,
    id_policy: HeartbeatIdPolicy,
}

impl HeartbeatScheduler {
    pub fn new(
        registry: SubscriptionRegistry,
        ids: Arc<MessageIdAllocator>,
        interval: Duration,
        payload: String,
        id_policy: HeartbeatIdPolicy,
    ) -> Self {
        Self {
            registry,
            ids,
            // tokio's interval panics on a zero period
            interval: interval.max(Duration::from_millis(1)),
            payload,
            id_policy,
        }
    }

    /// Run until `shutdown` flips to true or its sender is dropped.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!("Starting heart beat loop every {:?}", self.interval);
            // first tick one period after start; the registry is empty at construction
            let start = tokio::time::Instant::now() + self.interval;
            let mut interval = tokio::time::interval_at(start, self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        let report = self.tick().await;
                        if report.attempted > 0 {
                            debug!(
                                "Heart beat tick: {}/{} sent",
                                report.succeeded(),
                                report.attempted
                            );
                        }
                    }
                }
            }

            info!("Heart beat loop stopped");
        })
    }

    /// Send one heartbeat over every connection in a registry snapshot.
    pub async fn tick(&self) -> TickReport {
        let targets = self.registry.snapshot();
        if targets.is_empty() {
            return TickReport::default();
        }

        let shared_id = match self.id_policy {
            HeartbeatIdPolicy::Shared => Some(self.ids.next()),
            HeartbeatIdPolicy::PerTopic => None,
        };

        let sends = targets.into_iter().map(|(topic, connection)| {
            let message_id = shared_id.unwrap_or_else(|| self.ids.next());
            let request = CoapMessage::heartbeat(message_id, &self.payload);
            async move {
                match connection.send(&request).await {
                    Ok(()) => {
                        debug!("Send the heart beat in topic {}", topic);
                        Ok(())
                    }
                    Err(e) => {
                        warn!("Heart beat failed in topic {}: {}", topic, e);
                        Err(PubsubError::HeartbeatSend {
                            topic,
                            reason: e.to_string(),
                        })
                    }
                }
            }
        });

        let results = join_all(sends).await;
        TickReport {
            attempted: results.len(),
            failures: results.into_iter().filter_map(|r| r.err()).collect(),
        }
    }
}
