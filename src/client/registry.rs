//! Subscription registry
//!
//! The registry maps a topic name to its `SubscriptionEntry` and is the only
//! source of truth for "is this topic subscribed". It is written by
//! `add_sub`/`remove_sub` and read by the heartbeat tick and by every
//! delivery loop's liveness check.
//!
//! Concurrency note: the map sits behind a `std::sync::Mutex`. No method
//! holds the lock across an `.await`; the heartbeat works on a snapshot.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::client::subscription::Subscription;
use crate::transport::Connection;

/// Identity of one registration; a topic removed and re-added gets a new id.
pub type EntryId = u64;

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Per-topic record pairing the delivery channel with its connection.
pub struct SubscriptionEntry {
    pub id: EntryId,
    pub topic: String,
    pub subscription: Subscription,
    /// Exclusively owned; used for inbound delivery and outbound heartbeats.
    pub connection: Arc<dyn Connection>,
    cancel: watch::Sender<bool>,
}

impl SubscriptionEntry {
    /// Build an entry together with the cancellation receiver its delivery
    /// loop listens on.
    pub fn new(
        topic: &str,
        subscription: Subscription,
        connection: Arc<dyn Connection>,
    ) -> (Self, watch::Receiver<bool>) {
        let (cancel, cancelled) = watch::channel(false);
        let entry = Self {
            id: NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed),
            topic: topic.to_string(),
            subscription,
            connection,
            cancel,
        };
        (entry, cancelled)
    }

    /// Tell the delivery loop to stop.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }
}

impl fmt::Debug for SubscriptionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionEntry")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("connection", &"dyn Connection")
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    entries: Arc<Mutex<HashMap<String, SubscriptionEntry>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SubscriptionEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Channel of the current registration, if any.
    pub fn subscription(&self, topic: &str) -> Option<Subscription> {
        self.lock().get(topic).map(|e| e.subscription.clone())
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.lock().contains_key(topic)
    }

    /// True while `topic` is still registered under the given entry id.
    pub fn is_current(&self, topic: &str, id: EntryId) -> bool {
        self.lock().get(topic).is_some_and(|e| e.id == id)
    }

    /// Register an entry. An existing entry for the topic is replaced and
    /// returned so the caller can release it.
    pub fn insert(&self, entry: SubscriptionEntry) -> Option<SubscriptionEntry> {
        self.lock().insert(entry.topic.clone(), entry)
    }

    pub fn remove(&self, topic: &str) -> Option<SubscriptionEntry> {
        self.lock().remove(topic)
    }

    /// Remove `topic` only if it is still registered under `id`.
    pub fn remove_if_current(&self, topic: &str, id: EntryId) -> Option<SubscriptionEntry> {
        let mut entries = self.lock();
        if entries.get(topic).is_some_and(|e| e.id == id) {
            entries.remove(topic)
        } else {
            None
        }
    }

    /// Remove every entry.
    pub fn drain(&self) -> Vec<SubscriptionEntry> {
        self.lock().drain().map(|(_, e)| e).collect()
    }

    /// Topic and connection of every active entry at this instant.
    pub fn snapshot(&self) -> Vec<(String, Arc<dyn Connection>)> {
        self.lock()
            .values()
            .map(|e| (e.topic.clone(), Arc::clone(&e.connection)))
            .collect()
    }

    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.lock().keys().cloned().collect();
        topics.sort();
        topics
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
