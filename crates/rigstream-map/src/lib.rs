//! rigstream map - From channel intensities to rig targets
//!
//! The mapping is a weighted superposition: each channel owns one calibrated
//! vector per target, scaled by the channel intensity and summed.
//! - Width-checked mapping tables (dense or sparse rows)
//! - Calibration data for the facial and eyelid target sets
//! - Channel mapper with the jaw yaw special case
//! - Optional response curve applied after accumulation
//! - Head rotation and gaze target remapping

pub mod calibration;
pub mod curve;
pub mod head;
pub mod mapper;
pub mod table;

pub use calibration::*;
pub use curve::*;
pub use head::*;
pub use mapper::*;
pub use table::*;
