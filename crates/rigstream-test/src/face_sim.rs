//! Face tracker simulator
//!
//! Produces tracking-state datagrams the way the tracker would send them at
//! its frame rate: blend shapes in the studio-2014 layout, head pose and
//! eye angles. Values are drawn from a seeded RNG.

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rigstream_core::{EyeGaze, Quat, Vec3};
use rigstream_wire::{ChannelLayout, TrackingStateBuilder};

/// Face simulator configuration
#[derive(Clone, Debug)]
pub struct FaceSimConfig {
    pub layout: ChannelLayout,
    /// Tracker frame rate
    pub fps: f64,
    /// Fraction of frames that report lost tracking
    pub lost_ratio: f64,
    pub with_head_pose: bool,
    pub with_eyes: bool,
    pub seed: u64,
}

impl Default for FaceSimConfig {
    fn default() -> Self {
        Self {
            layout: ChannelLayout::Studio2014,
            fps: 30.0,
            lost_ratio: 0.0,
            with_head_pose: true,
            with_eyes: true,
            seed: 42,
        }
    }
}

pub struct FaceSimulator {
    config: FaceSimConfig,
    rng: StdRng,
    frame: u64,
}

impl FaceSimulator {
    pub fn new(config: FaceSimConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        FaceSimulator {
            config,
            rng,
            frame: 0,
        }
    }

    pub fn frames_generated(&self) -> u64 {
        self.frame
    }

    /// Build the next datagram
    pub fn next_message(&mut self) -> Bytes {
        let timestamp = self.frame as f64 / self.config.fps;
        self.frame += 1;

        let tracking_ok = !self.rng.gen_bool(self.config.lost_ratio.clamp(0.0, 1.0));
        let shapes: Vec<f32> = (0..self.config.layout.len())
            .map(|_| self.rng.gen_range(0.0..=1.0))
            .collect();

        let mut builder = TrackingStateBuilder::new()
            .frame_info(timestamp, tracking_ok)
            .blend_shapes(&shapes);

        if self.config.with_head_pose {
            let yaw = self.rng.gen_range(-0.4..0.4);
            let pitch = self.rng.gen_range(-0.2..0.2);
            builder = builder.head_pose_with_translation(
                Quat::from_euler_xyz(pitch, yaw, 0.0),
                Vec3::new(
                    self.rng.gen_range(-5.0..5.0),
                    self.rng.gen_range(-5.0..5.0),
                    self.rng.gen_range(-5.0..5.0),
                ),
            );
        }
        if self.config.with_eyes {
            let theta = self.rng.gen_range(-15.0..15.0);
            let phi = self.rng.gen_range(-15.0..15.0);
            builder = builder.eyes(EyeGaze {
                left_theta: theta,
                left_phi: phi,
                right_theta: theta,
                right_phi: phi,
            });
        }
        builder.build()
    }

    pub fn take(&mut self, count: usize) -> Vec<Bytes> {
        (0..count).map(|_| self.next_message()).collect()
    }
}

/// Tracked frame with every studio-2014 channel at zero except one
pub fn single_channel_message(channel: &str, value: f32) -> Option<Bytes> {
    let names = ChannelLayout::Studio2014.names();
    let index = names.iter().position(|n| *n == channel)?;
    let mut shapes = vec![0.0f32; names.len()];
    shapes[index] = value;
    Some(
        TrackingStateBuilder::new()
            .frame_info(0.0, true)
            .blend_shapes(&shapes)
            .build(),
    )
}

/// Tracked frame with `JawOpen` fully on
pub fn jaw_open_message() -> Bytes {
    let mut shapes = vec![0.0f32; ChannelLayout::Studio2014.len()];
    shapes[19] = 1.0; // JawOpen
    TrackingStateBuilder::new()
        .frame_info(0.0, true)
        .blend_shapes(&shapes)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigstream_wire::TrackingStateDecoder;

    #[test]
    fn test_messages_decode() {
        let mut sim = FaceSimulator::new(FaceSimConfig::default());
        let decoder = TrackingStateDecoder::default();
        for (i, message) in sim.take(20).iter().enumerate() {
            let frame = decoder.decode(message).unwrap();
            assert_eq!(frame.blend_shapes.len(), 51);
            assert!(frame.tracking_ok);
            assert!(frame.head_rotation.is_some());
            assert!(frame.eye_gaze.is_some());
            let expected = i as f64 / 30.0;
            assert!((frame.timestamp.unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let mut a = FaceSimulator::new(FaceSimConfig::default());
        let mut b = FaceSimulator::new(FaceSimConfig::default());
        assert_eq!(a.take(5), b.take(5));
    }

    #[test]
    fn test_jaw_open_message() {
        let frame = TrackingStateDecoder::default()
            .decode(&jaw_open_message())
            .unwrap();
        let on: Vec<_> = frame.channels().filter(|(_, v)| *v != 0.0).collect();
        assert_eq!(on, vec![("JawOpen", 1.0)]);
        assert_eq!(single_channel_message("JawOpen", 1.0), Some(jaw_open_message()));
        assert!(single_channel_message("NoSuchChannel", 1.0).is_none());
    }
}
