//! rigstream Test Harness - Synthetic streams and end-to-end validation
//!
//! This crate provides:
//! - Hand trajectories with seeded noise
//! - Face tracker simulation (tracking-state datagrams)
//! - Hand tracker simulation (JSON frames, id churn)
//! - End-to-end pipeline harness and grab scenarios

pub mod face_sim;
pub mod hand_sim;
pub mod pipeline;
pub mod trajectory;

pub use face_sim::*;
pub use hand_sim::*;
pub use pipeline::*;
pub use trajectory::*;
