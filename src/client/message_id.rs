//! Message ID allocation
//!
//! CoAP correlates a confirmable message with its acknowledgement through a
//! 16-bit message ID. IDs come from one shared counter so the subscription
//! path and the heartbeat task never hand out the same value before the
//! counter wraps.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicU16, Ordering};

use tracing::info;

#[derive(Debug)]
pub struct MessageIdAllocator {
    counter: AtomicU16,
}

impl MessageIdAllocator {
    /// Start counting after `seed`; the first ID handed out is `seed + 1`.
    pub fn with_seed(seed: u16) -> Self {
        Self {
            counter: AtomicU16::new(seed),
        }
    }

    /// Seed from the host's IPv4 address plus a random value so independently
    /// started clients talking to one server are unlikely to collide.
    pub fn seeded() -> Self {
        let seed = host_seed().wrapping_add(fastrand::u16(..));
        info!("Init msgID={}", seed);
        Self::with_seed(seed)
    }

    /// Next ID, wrapping at 2^16.
    pub fn next(&self) -> u16 {
        // fetch_add wraps on overflow
        self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Last ID handed out (or the seed if none has been).
    pub fn current(&self) -> u16 {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Default for MessageIdAllocator {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Last two octets of the local IPv4 address as a big-endian u16, or 0 when
/// the host has no routable IPv4 address.
pub fn host_seed() -> u16 {
    local_ipv4().map(ipv4_seed).unwrap_or(0)
}

pub(crate) fn ipv4_seed(ip: Ipv4Addr) -> u16 {
    let [_, _, c, d] = ip.octets();
    u16::from_be_bytes([c, d])
}

// Connecting a UDP socket only selects a route; nothing is sent.
fn local_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9)).ok()?;
    match socket.local_addr().ok()? {
        SocketAddr::V4(addr) if !addr.ip().is_unspecified() => Some(*addr.ip()),
        _ => None,
    }
}
