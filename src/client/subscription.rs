//! Subscriber-facing delivery channel
//!
//! A `Subscription` is the consumer end of one topic's bounded FIFO. The
//! client keeps a clone in the registry so a repeated `add_sub` hands back
//! the very same channel; clones share the receiver. Once the topic is
//! removed and its delivery loop exits, the producer side drops and `recv`
//! returns `None` after the buffered payloads are drained.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

#[derive(Debug, Clone)]
pub struct Subscription {
    topic: Arc<str>,
    receiver: Arc<Mutex<mpsc::Receiver<String>>>,
}

impl Subscription {
    /// Create the channel pair for `topic`.
    pub(crate) fn channel(topic: &str, capacity: usize) -> (mpsc::Sender<String>, Subscription) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let subscription = Subscription {
            topic: Arc::from(topic),
            receiver: Arc::new(Mutex::new(rx)),
        };
        (tx, subscription)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next delivered payload, in receive order.
    pub async fn recv(&self) -> Option<String> {
        self.receiver.lock().await.recv().await
    }

    /// A buffered payload if one is ready and no other clone is receiving.
    pub fn try_recv(&self) -> Option<String> {
        self.receiver.try_lock().ok()?.try_recv().ok()
    }

    /// True if both handles read from the same underlying channel.
    pub fn same_channel(&self, other: &Subscription) -> bool {
        Arc::ptr_eq(&self.receiver, &other.receiver)
    }
}
