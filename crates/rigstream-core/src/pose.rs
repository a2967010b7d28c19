//! Pose - the per-cycle output snapshot
//!
//! A Pose is what the rig application consumes. It carries no bone names
//! and no rig conventions: targets are index-aligned slots whose meaning is
//! fixed by the mapping table that produced them.

use std::collections::BTreeMap;

use crate::{EntityId, HandSide, JointSample, Quat, Vec3};

/// Number of facial displacement targets
pub const FACIAL_TARGET_COUNT: usize = 25;

/// Number of eyelid rotation targets (upper R, upper L, lower R, lower L)
pub const EYELID_TARGET_COUNT: usize = 4;

/// Hand-derived outputs
#[derive(Debug, Clone, PartialEq)]
pub struct HandPose {
    pub hand_id: EntityId,
    pub side: Option<HandSide>,
    pub palm_position: Vec3,
    /// Position averaged over the adaptive lookback window
    pub smoothed_position: Vec3,
    /// mm/s over the current lookback
    pub speed: f32,
    pub stable: bool,
    pub grabbing: bool,
    pub pointer_tip: Option<Vec3>,
    pub circle: Option<CircleState>,
}

/// Progress of the tracked circle gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleState {
    pub gesture_id: EntityId,
    pub progress: f32,
    pub center: Option<Vec3>,
    pub normal: Option<Vec3>,
}

/// Body-derived outputs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyPose {
    pub joints: BTreeMap<i32, JointSample>,
    pub label: Option<String>,
}

/// Normalized pose for one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    /// Cycle counter of the assembler that built it
    pub sequence: u64,
    /// Timestamp of the face frame the face fields came from
    pub face_timestamp: Option<f64>,
    /// Index-aligned facial target displacements
    pub target_displacements: Vec<Vec3>,
    pub jaw_yaw_degrees: f32,
    pub head_rotation: Option<Quat>,
    pub head_translation: Option<Vec3>,
    /// Euler (x, y, z) rotations, radians
    pub eyelid_rotations: [Vec3; EYELID_TARGET_COUNT],
    pub gaze_target: Option<Vec3>,
    pub hand: Option<HandPose>,
    pub body: Option<BodyPose>,
}

impl Pose {
    /// Rest pose with `targets` zero displacements
    pub fn rest(targets: usize) -> Self {
        Pose {
            sequence: 0,
            face_timestamp: None,
            target_displacements: vec![Vec3::ZERO; targets],
            jaw_yaw_degrees: 0.0,
            head_rotation: None,
            head_translation: None,
            eyelid_rotations: [Vec3::ZERO; EYELID_TARGET_COUNT],
            gaze_target: None,
            hand: None,
            body: None,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.target_displacements.iter().all(|v| *v == Vec3::ZERO)
            && self.jaw_yaw_degrees == 0.0
            && self.eyelid_rotations.iter().all(|v| *v == Vec3::ZERO)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose::rest(FACIAL_TARGET_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_pose() {
        let pose = Pose::default();
        assert_eq!(pose.target_displacements.len(), FACIAL_TARGET_COUNT);
        assert!(pose.is_rest());
        assert!(pose.head_rotation.is_none());
    }
}
