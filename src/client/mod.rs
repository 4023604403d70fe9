//! The `client` module is the subscription lifecycle and liveness engine.
//!
//! `PubsubClient` turns a topic name into an active, monitored channel: one
//! ADDSUB request and one delivery loop per topic, a shared heartbeat task
//! walking every active subscription, and a single message ID counter.

pub mod delivery;
pub mod heartbeat;
pub mod message_id;
pub mod pubsub_client;
pub mod registry;
pub mod request;
pub mod subscription;

pub use delivery::{DeliveryLoop, LoopExit};
pub use heartbeat::{HeartbeatScheduler, TickReport};
pub use message_id::MessageIdAllocator;
pub use pubsub_client::PubsubClient;
pub use registry::{SubscriptionEntry, SubscriptionRegistry};
pub use request::RequestSender;
pub use subscription::Subscription;
