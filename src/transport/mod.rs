//! The `transport` module is responsible for network communication with the
//! CoAP pub/sub server.
//!
//! It defines the protocol-level message model used by the client core, the
//! `Dialer`/`Connection` seam the core talks through, and the UDP
//! implementation of that seam.

pub mod connection;
pub mod message;
pub mod udp;

pub use connection::{Connection, Dialer};
pub use message::{CoapMessage, Code, Command, MessageType, topic_path};
pub use udp::{UdpConnection, UdpDialer};

#[cfg(test)]
mod tests;
