//! Body tracker client
//!
//! Discovery is a broadcast `where_are_you`; the server address is taken
//! from the source of the `here_I_am` answer. Joint samples are merged into
//! a running `JointFrame` so a consumer always sees the full skeleton.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use rigstream_core::{DecodeError, JointFrame, TransportError};
use rigstream_wire::{
    decode_body_packet, send_me_info, where_are_you, BodyMessage, UserPosition, BODY_SERVER_PORT,
};

use crate::{
    spawn_receiver, Datagram, FrameDecoder, ReceiverConfig, ReceiverHandle, UdpConfig,
    UdpTransport, DEFAULT_RECV_TIMEOUT,
};

type ServerSlot = Arc<Mutex<Option<SocketAddr>>>;

/// Stateful decoder for the body stream
#[derive(Debug, Default)]
pub struct BodyDecoder {
    frame: JointFrame,
    server: ServerSlot,
}

impl BodyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_server_slot(server: ServerSlot) -> Self {
        BodyDecoder {
            frame: JointFrame::default(),
            server,
        }
    }

    /// Last discovered server
    pub fn server_addr(&self) -> Option<SocketAddr> {
        *self.server.lock()
    }
}

impl FrameDecoder for BodyDecoder {
    type Frame = JointFrame;

    fn decode(&mut self, datagram: &Datagram) -> Result<Option<JointFrame>, DecodeError> {
        let mut changed = false;
        for message in decode_body_packet(&datagram.payload)? {
            match message {
                BodyMessage::Joint { joint_id, sample } => {
                    self.frame.joints.insert(joint_id, sample);
                    changed = true;
                }
                BodyMessage::Pose(name) => {
                    self.frame.pose = Some(name);
                    changed = true;
                }
                BodyMessage::ServerHere => match datagram.from {
                    Some(from) => {
                        let server = SocketAddr::new(from.ip(), BODY_SERVER_PORT);
                        info!(%server, "body tracker server discovered");
                        *self.server.lock() = Some(server);
                    }
                    None => debug!("server answer without a source address"),
                },
            }
        }
        Ok(changed.then(|| self.frame.clone()))
    }
}

#[derive(Clone, Debug)]
pub struct BodyTrackerConfig {
    pub listen: UdpConfig,
    /// Where discovery requests go
    pub discovery_addr: SocketAddr,
    pub recv_timeout: Duration,
}

impl Default for BodyTrackerConfig {
    fn default() -> Self {
        Self {
            listen: UdpConfig::body_listener(),
            discovery_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), BODY_SERVER_PORT),
            recv_timeout: DEFAULT_RECV_TIMEOUT,
        }
    }
}

/// Client side of the body tracker protocol
pub struct BodyTrackerClient {
    sender: UdpTransport,
    server: ServerSlot,
    discovery_addr: SocketAddr,
    listen_addr: SocketAddr,
    receiver: ReceiverHandle<JointFrame>,
}

impl BodyTrackerClient {
    /// Bind the listener and start receiving
    pub async fn start(config: &BodyTrackerConfig) -> Result<Self, TransportError> {
        let listener = UdpTransport::open(&config.listen).await?;
        let listen_addr = listener.local_addr();
        let sender = UdpTransport::open(&UdpConfig {
            reuse_address: true,
            broadcast: true,
            ..Default::default()
        })
        .await?;

        let server = ServerSlot::default();
        let receiver = spawn_receiver(
            listener,
            BodyDecoder::with_server_slot(Arc::clone(&server)),
            ReceiverConfig::new("body").with_timeout(config.recv_timeout),
        );

        Ok(BodyTrackerClient {
            sender,
            server,
            discovery_addr: config.discovery_addr,
            listen_addr,
            receiver,
        })
    }

    /// Broadcast a discovery request. The answer arrives asynchronously.
    pub async fn discover(&self) -> Result<(), TransportError> {
        let bytes = where_are_you().map_err(|e| TransportError::Send(e.to_string()))?;
        debug!(to = %self.discovery_addr, "sending body tracker discovery");
        self.sender.send_to(&bytes, self.discovery_addr).await
    }

    pub fn server_addr(&self) -> Option<SocketAddr> {
        *self.server.lock()
    }

    /// Local address answers and joint data arrive on
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    pub fn is_discovered(&self) -> bool {
        self.server_addr().is_some()
    }

    /// Ask the discovered server to stream the user at `position`
    pub async fn request_user(&self, position: UserPosition) -> Result<(), TransportError> {
        let server = self.server_addr().ok_or(TransportError::NotDiscovered)?;
        let bytes = send_me_info(position).map_err(|e| TransportError::Send(e.to_string()))?;
        debug!(%server, position = position.as_str(), "requesting body data");
        self.sender.send_to(&bytes, server).await
    }

    pub fn receiver(&self) -> &ReceiverHandle<JointFrame> {
        &self.receiver
    }

    pub fn latest(&self) -> Option<Arc<JointFrame>> {
        self.receiver.latest()
    }

    pub fn stop(&self) {
        self.receiver.stop();
    }

    pub async fn shutdown(mut self) {
        self.receiver.shutdown().await;
        self.sender.close();
    }
}
