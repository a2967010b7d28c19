//! WebSocket transport for the hand tracker service
//!
//! The service keeps one long-lived connection and pushes a JSON frame per
//! tracker frame. After connecting the client asks for gestures (and, for
//! protocol v2, for frames while unfocused).

use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use rigstream_core::TransportError;
use rigstream_wire::{enable_gestures_request, focus_request};

use crate::{Datagram, PacketSource};

/// Default service endpoint
pub const HAND_SERVICE_URL: &str = "ws://localhost:6437/";

/// Protocol version the client speaks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HandProtocol {
    #[default]
    V1,
    /// Versioned endpoint (`v6.json`), needs an explicit focus request
    V2,
}

#[derive(Clone, Debug)]
pub struct WebSocketConfig {
    pub url: String,
    pub protocol: HandProtocol,
    pub connect_timeout: Duration,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: HAND_SERVICE_URL.to_string(),
            protocol: HandProtocol::V1,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl WebSocketConfig {
    /// URL actually dialed for the configured protocol
    pub fn endpoint(&self) -> String {
        match self.protocol {
            HandProtocol::V1 => self.url.clone(),
            HandProtocol::V2 => {
                let base = self.url.trim_end_matches('/');
                format!("{}/v6.json", base)
            }
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport
pub struct WebSocketTransport {
    stream: Option<WsStream>,
    endpoint: String,
}

impl WebSocketTransport {
    /// Connect and send the opening requests
    pub async fn connect(config: &WebSocketConfig) -> Result<Self, TransportError> {
        let endpoint = config.endpoint();
        let connecting = connect_async(endpoint.as_str());
        let (stream, _) = tokio::time::timeout(config.connect_timeout, connecting)
            .await
            .map_err(|_| TransportError::Connect(format!("timed out connecting to {}", endpoint)))?
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        info!(%endpoint, "websocket connected");

        let mut transport = WebSocketTransport {
            stream: Some(stream),
            endpoint,
        };
        transport.send_text(enable_gestures_request()).await?;
        if config.protocol == HandProtocol::V2 {
            transport.send_text(focus_request()).await?;
        }
        Ok(transport)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    pub async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::Closed)?;
        if let Err(e) = stream.send(Message::Text(text)).await {
            self.close();
            return Err(TransportError::Send(e.to_string()));
        }
        Ok(())
    }

    /// Wait up to `timeout` for the next data message. Control frames are
    /// consumed here and never surface.
    pub async fn receive(&mut self, timeout: Duration) -> Result<Option<Datagram>, TransportError> {
        let deadline = Instant::now() + timeout;
        loop {
            let stream = self.stream.as_mut().ok_or(TransportError::Closed)?;
            let next = match tokio::time::timeout_at(deadline, stream.next()).await {
                Err(_) => return Ok(None),
                Ok(next) => next,
            };
            match next {
                None => {
                    self.close();
                    return Err(TransportError::Closed);
                }
                Some(Err(e)) => {
                    self.close();
                    return Err(TransportError::Receive(e.to_string()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Datagram::new(Bytes::from(text.into_bytes()))))
                }
                Some(Ok(Message::Binary(data))) => return Ok(Some(Datagram::new(data))),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "websocket closed by peer");
                    self.close();
                    return Err(TransportError::Closed);
                }
                Some(Ok(_)) => continue,
            }
        }
    }

    /// Drop the connection. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            info!(endpoint = %self.endpoint, "websocket closed");
        }
    }
}

impl PacketSource for WebSocketTransport {
    async fn recv(&mut self, timeout: Duration) -> Result<Option<Datagram>, TransportError> {
        self.receive(timeout).await
    }

    fn close(&mut self) {
        WebSocketTransport::close(self)
    }
}
