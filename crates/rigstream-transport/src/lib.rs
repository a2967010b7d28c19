//! rigstream transport - Stream sources and receiver tasks
//!
//! Transports deliver raw payloads; receivers decode them off the consumer's
//! thread and publish only the latest frame:
//! - UDP datagram transport with a small OS receive buffer
//! - WebSocket transport for the hand tracker service
//! - Body tracker client (OSC broadcast discovery)
//! - Receiver task with cooperative, idempotent stop
//! - Latest-value slot shared with the consumer
//! - Hand forwarder (WebSocket to UDP bridge)

pub mod body;
pub mod forward;
pub mod receiver;
pub mod slot;
pub mod source;
pub mod udp;
pub mod websocket;

pub use body::*;
pub use forward::*;
pub use receiver::*;
pub use slot::*;
pub use source::*;
pub use udp::*;
pub use websocket::*;
