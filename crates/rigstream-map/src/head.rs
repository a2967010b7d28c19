//! Head rotation and gaze remapping
//!
//! The face tracker's head frame is mirrored on the XZ plane relative to the
//! rig: the rotation is conjugated by `diag(1, -1, -1)`. Gaze is expressed as
//! a target point at a fixed distance in front of the eye.

use rigstream_core::{EyeGaze, Mat3, Quat, Vec3};

/// XZ-plane mirror
pub const MIRROR_XZ: Mat3 = Mat3::diagonal(1.0, -1.0, -1.0);

/// Distance of the gaze target from the eye
pub const GAZE_DISTANCE: f32 = 6.0;

/// Tracker head rotation expressed in rig space
pub fn head_rotation_to_rig(rotation: Quat) -> Quat {
    // MIRROR_XZ is its own inverse
    (MIRROR_XZ * rotation.normalize().to_mat3() * MIRROR_XZ).to_quat()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GazeConfig {
    pub distance: f32,
    /// Eye position the target is offset from
    pub eye_origin: Vec3,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            distance: GAZE_DISTANCE,
            eye_origin: Vec3::ZERO,
        }
    }
}

/// Eye rotation from tracker angles in degrees: pitch `theta` about X,
/// then yaw `-phi` about Z
pub fn eye_rotation(theta_degrees: f32, phi_degrees: f32) -> Quat {
    Quat::from_euler_xyz(theta_degrees.to_radians(), 0.0, (-phi_degrees).to_radians())
}

/// Gaze target for the left eye, given the rig-space head rotation
pub fn gaze_target(head_rotation: Quat, gaze: &EyeGaze, config: &GazeConfig) -> Vec3 {
    let forward = Vec3::new(0.0, -config.distance, 0.0);
    let eye = eye_rotation(gaze.left_theta, gaze.left_phi);
    config.eye_origin + (head_rotation * eye).rotate(forward)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn same_rotation(a: Quat, b: Quat) -> bool {
        let dot = a.w * b.w + a.x * b.x + a.y * b.y + a.z * b.z;
        (dot.abs() - 1.0).abs() < 1e-4
    }

    #[test]
    fn test_identity_head_stays_identity() {
        assert!(same_rotation(head_rotation_to_rig(Quat::IDENTITY), Quat::IDENTITY));
    }

    #[test]
    fn test_mirror_flips_y_and_z() {
        let q = Quat::from_axis_angle(Vec3::new(0.3, -0.5, 0.8), 0.7);
        let mirrored = head_rotation_to_rig(q);
        assert!(same_rotation(mirrored, Quat::new(q.w, q.x, -q.y, -q.z)));

        // Yaw about Z reverses, pitch about X is kept
        let pitch = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), 0.4);
        assert!(same_rotation(head_rotation_to_rig(pitch), pitch));
        let yaw = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), 0.4);
        let back = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), -0.4);
        assert!(same_rotation(head_rotation_to_rig(yaw), back));
    }

    #[test]
    fn test_gaze_straight_ahead() {
        let target = gaze_target(Quat::IDENTITY, &EyeGaze::default(), &GazeConfig::default());
        assert!(target.max_abs_diff(Vec3::new(0.0, -6.0, 0.0)) < EPS);
    }

    #[test]
    fn test_gaze_angles() {
        let config = GazeConfig {
            distance: 6.0,
            eye_origin: Vec3::new(1.0, 0.0, 2.0),
        };
        let up = EyeGaze {
            left_theta: 90.0,
            ..Default::default()
        };
        let target = gaze_target(Quat::IDENTITY, &up, &config);
        assert!(target.max_abs_diff(Vec3::new(1.0, 0.0, -4.0)) < 1e-4);

        let side = EyeGaze {
            left_phi: 90.0,
            ..Default::default()
        };
        let target = gaze_target(Quat::IDENTITY, &side, &config);
        assert!(target.max_abs_diff(Vec3::new(-5.0, 0.0, 2.0)) < 1e-4);
    }

    #[test]
    fn test_gaze_follows_head() {
        let head = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), std::f32::consts::PI);
        let target = gaze_target(head, &EyeGaze::default(), &GazeConfig::default());
        assert!(target.max_abs_diff(Vec3::new(0.0, 6.0, 0.0)) < 1e-4);
    }
}
