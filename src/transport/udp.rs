//! UDP transport
//!
//! Each dial binds a fresh ephemeral socket and `connect`s it to the server,
//! so the kernel filters out datagrams from any other peer and the NAT
//! mapping for that socket is what the heartbeats keep alive.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::net::{UdpSocket, lookup_host};
use tracing::debug;

use crate::transport::connection::{Connection, Dialer};
use crate::transport::message::CoapMessage;
use crate::utils::error::{PubsubError, Result};

/// Largest UDP payload. Reads use a buffer this size so the kernel never
/// truncates a publication.
pub const MAX_DATAGRAM: usize = 65_535;

#[derive(Debug, Clone, Copy, Default)]
pub struct UdpDialer;

#[async_trait]
impl Dialer for UdpDialer {
    async fn dial(&self, address: &str) -> Result<Arc<dyn Connection>> {
        let connection = UdpConnection::connect(address).await?;
        Ok(Arc::new(connection))
    }
}

#[derive(Debug)]
pub struct UdpConnection {
    socket: UdpSocket,
    peer: SocketAddr,
    closed: AtomicBool,
}

impl UdpConnection {
    pub async fn connect(address: &str) -> Result<Self> {
        let peer = lookup_host(address)
            .await
            .map_err(|e| PubsubError::connection(format!("{address}: {e}")))?
            .next()
            .ok_or_else(|| PubsubError::connection(format!("{address}: no address resolved")))?;

        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| PubsubError::connection(format!("bind {local}: {e}")))?;
        socket
            .connect(peer)
            .await
            .map_err(|e| PubsubError::connection(format!("{peer}: {e}")))?;

        debug!("Dialed {} from {:?}", peer, socket.local_addr().ok());

        Ok(Self {
            socket,
            peer,
            closed: AtomicBool::new(false),
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

#[async_trait]
impl Connection for UdpConnection {
    async fn send(&self, message: &CoapMessage) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PubsubError::transport(format!("connection to {} closed", self.peer)));
        }

        let bytes = message.encode()?;
        self.socket
            .send(&bytes)
            .await
            .map_err(|e| PubsubError::transport(format!("send to {}: {e}", self.peer)))?;
        Ok(())
    }

    async fn receive(&self) -> Result<CoapMessage> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let n = self
            .socket
            .recv(&mut buf)
            .await
            .map_err(|e| PubsubError::receive(format!("recv from {}: {e}", self.peer)))?;
        if n == buf.len() {
            // a payload runs to the end of the datagram, so a cut one would decode
            return Err(PubsubError::codec(format!(
                "datagram from {} fills the {MAX_DATAGRAM} byte buffer, dropped as truncated",
                self.peer
            )));
        }
        CoapMessage::decode(&buf[..n])
    }

    async fn close(&self) {
        // The socket itself is released when the last handle drops.
        self.closed.store(true, Ordering::Release);
    }
}
