//! Hand forwarder
//!
//! Bridges the hand tracker's WebSocket feed onto local UDP so the hand
//! receiver can treat both feeds alike. Oversized messages are skipped.

use std::net::SocketAddr;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use rigstream_core::TransportError;
use rigstream_wire::MAX_HAND_MESSAGE_SIZE;

use crate::{UdpTransport, WebSocketConfig, WebSocketTransport, HAND_UDP_PORT};

/// Log a heartbeat every this many messages
pub const HEARTBEAT_INTERVAL: u64 = 100;

#[derive(Clone, Debug)]
pub struct ForwarderConfig {
    pub websocket: WebSocketConfig,
    pub target: SocketAddr,
    pub max_message_size: usize,
    pub recv_timeout: Duration,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            websocket: WebSocketConfig::default(),
            target: SocketAddr::from(([127, 0, 0, 1], HAND_UDP_PORT)),
            max_message_size: MAX_HAND_MESSAGE_SIZE,
            recv_timeout: Duration::from_millis(100),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForwarderStats {
    /// Messages received from the WebSocket
    pub received: u64,
    pub forwarded: u64,
    pub skipped_oversize: u64,
    /// Largest message seen so far
    pub max_size: usize,
}

/// Run until `cancel` fires or the WebSocket closes.
///
/// A peer closing the connection ends the run normally; other transport
/// errors are returned.
pub async fn run_forwarder(
    config: &ForwarderConfig,
    cancel: CancellationToken,
) -> Result<ForwarderStats, TransportError> {
    let mut ws = WebSocketTransport::connect(&config.websocket).await?;
    let mut udp = UdpTransport::bind(SocketAddr::from(([0, 0, 0, 0], 0))).await?;
    info!(from = ws.endpoint(), to = %config.target, "hand forwarder running");

    let mut stats = ForwarderStats::default();
    let result = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break Ok(()),
            next = ws.receive(config.recv_timeout) => next,
        };
        let datagram = match next {
            Ok(Some(datagram)) => datagram,
            Ok(None) => continue,
            Err(TransportError::Closed) => break Ok(()),
            Err(e) => break Err(e),
        };

        stats.received += 1;
        let size = datagram.payload.len();
        if size > stats.max_size {
            stats.max_size = size;
            info!(max_size = size, "new largest hand message");
        }
        if size > config.max_message_size {
            stats.skipped_oversize += 1;
            warn!(size, limit = config.max_message_size, "hand message too long, skipping");
        } else if let Err(e) = udp.send_to(&datagram.payload, config.target).await {
            break Err(e);
        } else {
            stats.forwarded += 1;
        }

        if stats.received % HEARTBEAT_INTERVAL == 0 {
            info!(
                sent = stats.forwarded,
                max_size = stats.max_size,
                "hand forwarder alive"
            );
        }
    };

    ws.close();
    udp.close();
    info!(?stats, "hand forwarder stopped");
    result.map(|_| stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::Message;

    #[tokio::test]
    async fn test_forwards_and_skips_oversize() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let ws_addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            // enableGestures request
            let _ = ws.next().await;
            ws.send(Message::Text(r#"{"id":1}"#.to_string()))
                .await
                .unwrap();
            ws.send(Message::Text("x".repeat(64))).await.unwrap();
            ws.send(Message::Text(r#"{"id":2}"#.to_string()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        });

        let mut sink = UdpTransport::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let config = ForwarderConfig {
            websocket: WebSocketConfig {
                url: format!("ws://{}/", ws_addr),
                ..Default::default()
            },
            target: sink.local_addr(),
            max_message_size: 32,
            recv_timeout: Duration::from_millis(50),
        };

        let stats = run_forwarder(&config, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(stats.received, 3);
        assert_eq!(stats.forwarded, 2);
        assert_eq!(stats.skipped_oversize, 1);
        assert_eq!(stats.max_size, 64);

        let first = sink.receive(Duration::from_secs(2)).await.unwrap().unwrap();
        assert_eq!(first.payload.as_ref(), br#"{"id":1}"#);
        let second = sink.receive(Duration::from_secs(2)).await.unwrap().unwrap();
        assert_eq!(second.payload.as_ref(), br#"{"id":2}"#);
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ForwarderConfig {
            websocket: WebSocketConfig {
                url: format!("ws://{}/", addr),
                connect_timeout: Duration::from_secs(2),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = run_forwarder(&config, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect(_)));
    }
}
