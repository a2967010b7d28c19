//! Packet source abstraction

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;

use rigstream_core::TransportError;

/// One received payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Datagram {
    pub payload: Bytes,
    /// Sender address, when the transport knows it
    pub from: Option<SocketAddr>,
}

impl Datagram {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Datagram {
            payload: payload.into(),
            from: None,
        }
    }
}

/// Something a receiver task can pull payloads from.
///
/// `recv` returns `Ok(None)` when nothing arrived within `timeout`. Any
/// `Err` is fatal for the source: it has already released its socket.
pub trait PacketSource: Send + 'static {
    fn recv(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<Datagram>, TransportError>> + Send;

    /// Release the underlying socket. Idempotent.
    fn close(&mut self);
}
