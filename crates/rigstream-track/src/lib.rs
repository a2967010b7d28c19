//! rigstream track - Which entity, and what is it doing
//!
//! Consumer-side state for the hand stream:
//! - Identity selection that survives id churn (hands, fingers, circles)
//! - Time-bounded motion buffer with stability and speed queries
//! - Hand tracker with frame de-duplication
//! - Grab activation logic driven by motion heuristics

pub mod activation;
pub mod motion;
pub mod selector;

pub use activation::*;
pub use motion::*;
pub use selector::*;
