//! rigstream Runtime - Frame assembly and orchestration
//!
//! Each tick of the runtime:
//! 1. Collects receiver failures
//! 2. Takes the newest frame of each stream
//! 3. Assembles the pose: face mapping, hand tracking and grab logic, body joints
//!
//! Configuration is loaded from TOML; binaries set up tracing through
//! `telemetry`.

pub mod assembler;
pub mod config;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod telemetry;

pub use assembler::*;
pub use config::*;
pub use runtime::*;
pub use scheduler::*;
pub use session::*;
pub use telemetry::*;
