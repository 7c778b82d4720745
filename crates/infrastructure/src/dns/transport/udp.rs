//! UDP transport (RFC 1035 §4.2.1).
//!
//! One unconnected socket serves every upstream of its address family.
//! Responses are read by the multiplexer's receive loop and matched to
//! waiting queries there, so this type only moves datagrams.

use ferrous_resolver_domain::DomainError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

/// Large enough for any EDNS(0) payload an upstream might send unasked.
pub const MAX_UDP_MESSAGE_SIZE: usize = 4096;

const RECV_BUFFER_SIZE: usize = 256 * 1024;
const SEND_BUFFER_SIZE: usize = 128 * 1024;

pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Binds an ephemeral port of the same family as `server`.
    /// Must be called from within a tokio runtime.
    pub fn bind_for(server: &SocketAddr) -> Result<Self, DomainError> {
        let bind_addr = if server.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        Self::bind(bind_addr)
    }

    pub fn bind(bind_addr: SocketAddr) -> Result<Self, DomainError> {
        let socket = create_socket(bind_addr).map_err(|e| {
            DomainError::IoError(format!("Failed to bind UDP socket on {}: {}", bind_addr, e))
        })?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| DomainError::IoError(format!("Failed to read local address: {}", e)))?;

        debug!(local = %local_addr, "UDP socket bound");
        Ok(Self { socket, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn send(&self, message_bytes: &[u8], server: SocketAddr) -> Result<(), DomainError> {
        let bytes_sent = self
            .socket
            .send_to(message_bytes, server)
            .await
            .map_err(|e| {
                DomainError::IoError(format!("Failed to send UDP query to {}: {}", server, e))
            })?;

        debug!(server = %server, bytes_sent, "UDP query sent");
        Ok(())
    }

    /// Waits up to `timeout` for the next datagram from any source.
    pub async fn receive(&self, timeout: Duration) -> Result<(Vec<u8>, SocketAddr), DomainError> {
        let mut buf = vec![0u8; MAX_UDP_MESSAGE_SIZE];

        let (bytes_received, from_addr) = tokio::time::timeout(timeout, self.socket.recv_from(&mut buf))
            .await
            .map_err(|_| DomainError::Timeout {
                server: self.local_addr.to_string(),
            })?
            .map_err(|e| DomainError::IoError(format!("Failed to receive UDP datagram: {}", e)))?;

        buf.truncate(bytes_received);
        Ok((buf, from_addr))
    }
}

fn create_socket(bind_addr: SocketAddr) -> std::io::Result<UdpSocket> {
    let domain = if bind_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if bind_addr.is_ipv6() {
        socket.set_only_v6(true)?;
    }
    socket.set_recv_buffer_size(RECV_BUFFER_SIZE)?;
    socket.set_send_buffer_size(SEND_BUFFER_SIZE)?;
    socket.bind(&bind_addr.into())?;
    socket.set_nonblocking(true)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}
