//! UDP transport implementation

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::info;

use rigstream_core::TransportError;
use rigstream_wire::{BODY_LOCAL_PORT, MAX_HAND_MESSAGE_SIZE};

use crate::{Datagram, PacketSource};

/// Largest UDP payload
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Face tracker datagrams never exceed this
pub const FACE_DATAGRAM_SIZE: usize = 4096;

/// OS receive buffer for the face stream; roughly one datagram so the
/// kernel drops backlog instead of queueing it
pub const FACE_RECV_BUFFER: usize = 1500;

/// Face tracker streaming port
pub const FACE_UDP_PORT: u16 = 33433;

/// Hand tracker forwarder port
pub const HAND_UDP_PORT: u16 = 6437;

/// UDP socket options
#[derive(Clone, Debug)]
pub struct UdpConfig {
    pub bind_addr: SocketAddr,
    /// SO_RCVBUF, applied before bind
    pub recv_buffer_size: Option<usize>,
    pub reuse_address: bool,
    pub broadcast: bool,
    /// Receive buffer length; longer datagrams are truncated
    pub max_datagram_size: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            recv_buffer_size: None,
            reuse_address: false,
            broadcast: false,
            max_datagram_size: MAX_DATAGRAM_SIZE,
        }
    }
}

impl UdpConfig {
    pub fn face_tracker() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], FACE_UDP_PORT)),
            recv_buffer_size: Some(FACE_RECV_BUFFER),
            max_datagram_size: FACE_DATAGRAM_SIZE,
            ..Default::default()
        }
    }

    pub fn hand_tracker() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], HAND_UDP_PORT)),
            max_datagram_size: MAX_HAND_MESSAGE_SIZE,
            ..Default::default()
        }
    }

    pub fn body_listener() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], BODY_LOCAL_PORT)),
            reuse_address: true,
            broadcast: true,
            ..Default::default()
        }
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }
}

fn bind_error(addr: SocketAddr, e: std::io::Error) -> TransportError {
    TransportError::Bind {
        addr: addr.to_string(),
        reason: e.to_string(),
    }
}

/// UDP transport
pub struct UdpTransport {
    socket: Option<Arc<UdpSocket>>,
    local_addr: SocketAddr,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Open a socket with the given options. Must run inside a tokio runtime.
    pub async fn open(config: &UdpConfig) -> Result<Self, TransportError> {
        let addr = config.bind_addr;
        let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| bind_error(addr, e))?;

        if let Some(size) = config.recv_buffer_size {
            socket
                .set_recv_buffer_size(size)
                .map_err(|e| bind_error(addr, e))?;
        }
        if config.reuse_address {
            socket
                .set_reuse_address(true)
                .map_err(|e| bind_error(addr, e))?;
        }
        if config.broadcast {
            socket.set_broadcast(true).map_err(|e| bind_error(addr, e))?;
        }
        socket
            .set_nonblocking(true)
            .map_err(|e| bind_error(addr, e))?;
        socket
            .bind(&addr.into())
            .map_err(|e| bind_error(addr, e))?;

        let socket = UdpSocket::from_std(socket.into()).map_err(|e| bind_error(addr, e))?;
        let local_addr = socket.local_addr().map_err(|e| bind_error(addr, e))?;
        info!(%local_addr, "udp transport bound");

        Ok(UdpTransport {
            socket: Some(Arc::new(socket)),
            local_addr,
            buf: vec![0u8; config.max_datagram_size.max(1)],
        })
    }

    /// Bind to a local address with default options
    pub async fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        Self::open(&UdpConfig::default().with_bind_addr(addr)).await
    }

    /// Get local address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_closed(&self) -> bool {
        self.socket.is_none()
    }

    fn socket(&self) -> Result<&Arc<UdpSocket>, TransportError> {
        self.socket.as_ref().ok_or(TransportError::Closed)
    }

    /// Send raw bytes to a destination
    pub async fn send_to(&self, bytes: &[u8], dest: SocketAddr) -> Result<(), TransportError> {
        self.socket()?
            .send_to(bytes, dest)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(())
    }

    /// Wait up to `timeout` for one datagram
    pub async fn receive(&mut self, timeout: Duration) -> Result<Option<Datagram>, TransportError> {
        let socket = Arc::clone(self.socket()?);
        match tokio::time::timeout(timeout, socket.recv_from(&mut self.buf)).await {
            Err(_) => Ok(None),
            Ok(Ok((len, from))) => Ok(Some(Datagram {
                payload: Bytes::copy_from_slice(&self.buf[..len]),
                from: Some(from),
            })),
            Ok(Err(e)) => {
                self.close();
                Err(TransportError::Receive(e.to_string()))
            }
        }
    }

    /// Drop the socket. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.socket.take().is_some() {
            info!(local_addr = %self.local_addr, "udp transport closed");
        }
    }
}

impl PacketSource for UdpTransport {
    async fn recv(&mut self, timeout: Duration) -> Result<Option<Datagram>, TransportError> {
        self.receive(timeout).await
    }

    fn close(&mut self) {
        UdpTransport::close(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> UdpConfig {
        UdpConfig::default().with_bind_addr("127.0.0.1:0".parse().unwrap())
    }

    #[tokio::test]
    async fn test_udp_transport_bind() {
        let transport = UdpTransport::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();

        assert_ne!(transport.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn test_receive_timeout_is_none() {
        let mut rx = UdpTransport::open(&loopback()).await.unwrap();
        let got = rx.receive(Duration::from_millis(20)).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let mut rx = UdpTransport::open(&UdpConfig {
            recv_buffer_size: Some(FACE_RECV_BUFFER),
            ..loopback()
        })
        .await
        .unwrap();
        let tx = UdpTransport::open(&loopback()).await.unwrap();

        tx.send_to(b"hello", rx.local_addr()).await.unwrap();
        let got = rx.receive(Duration::from_secs(2)).await.unwrap().unwrap();
        assert_eq!(&got.payload[..], b"hello");
        assert_eq!(got.from, Some(tx.local_addr()));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut rx = UdpTransport::open(&loopback()).await.unwrap();
        rx.close();
        rx.close();
        assert!(rx.is_closed());
        assert_eq!(
            rx.receive(Duration::from_millis(1)).await,
            Err(TransportError::Closed)
        );
    }
}
