//! rigstream core - Fundamental types and primitives
//!
//! This crate defines the types shared by every stage of the pipeline:
//! - Vector, quaternion and matrix math (Vec3, Quat, Mat3)
//! - Stream time (StreamTime, StreamClock)
//! - Tracked entities (Hand, Pointable, Gesture)
//! - Decoded frames (FaceFrame, HandFrame, JointFrame)
//! - The per-cycle output snapshot (Pose)
//! - The error taxonomy

pub mod math;
pub mod time;
pub mod entity;
pub mod frame;
pub mod pose;
pub mod error;

pub use math::*;
pub use time::*;
pub use entity::*;
pub use frame::*;
pub use pose::*;
pub use error::*;
