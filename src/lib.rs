//! # coap_pubsub
//!
//! `coap_pubsub` is a publish/subscribe client built on the CoAP
//! request/response model. An application subscribes to named topics over
//! UDP, receives a stream of published values per topic and unsubscribes
//! cleanly, while a background heartbeat keeps each topic's UDP mapping
//! alive through NATs and firewalls.
//!
//! ## Core Modules
//!
//! - `client`: the subscription lifecycle: registry, delivery loops,
//!   heartbeat scheduler and the `PubsubClient` façade.
//! - `transport`: CoAP message model, wire codec and the UDP connection.
//! - `config`: loading client settings from files and the environment.
//! - `utils`: shared error type and logging setup.
//!
//! ```no_run
//! # async fn run() -> coap_pubsub::Result<()> {
//! use coap_pubsub::PubsubClient;
//!
//! let client = PubsubClient::connect("192.168.1.10:5683");
//! let temps = client.add_sub("sensors/temp").await?;
//! while let Some(value) = temps.recv().await {
//!     println!("temp = {value}");
//! }
//! client.remove_sub("sensors/temp").await?;
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod transport;
pub mod utils;

pub use client::{PubsubClient, Subscription};
pub use crate::config::ClientConfig;
pub use utils::error::{PubsubError, Result};
