//! rigstream wire - Tracker wire formats
//!
//! This crate turns raw tracker payloads into typed frames:
//! - Block header (8 bytes, little-endian)
//! - Tracking-state decoder and builder (face tracker, binary)
//! - Channel layouts for the blend-shape block
//! - Hand protocol (JSON)
//! - Body joint protocol (OSC)

pub mod channels;
pub mod hand;
pub mod header;
pub mod osc;
pub mod reader;
pub mod tracking;

pub use channels::*;
pub use hand::*;
pub use header::*;
pub use osc::*;
pub use reader::*;
pub use tracking::*;
