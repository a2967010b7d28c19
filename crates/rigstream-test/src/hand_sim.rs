//! Hand tracker simulator
//!
//! Emits JSON frames in the hand tracker's format with one hand following a
//! trajectory. Frame ids increase by one per frame and the hand id can be
//! reassigned mid-stream to exercise identity churn.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use rigstream_core::Vec3;

use crate::trajectory::NoisyTrajectory;

/// Microseconds between frames at the simulated frame rate
pub const DEFAULT_FRAME_INTERVAL_US: i64 = 20_000;

#[derive(Clone, Debug)]
pub struct HandSimConfig {
    pub frame_interval_us: i64,
    /// Extended fingers reported for the hand
    pub fingers: usize,
    /// Probability per frame that the tracker reassigns the hand id
    pub id_churn: f64,
    /// Include a circle gesture in every frame
    pub circle_gesture: bool,
    pub seed: u64,
}

impl Default for HandSimConfig {
    fn default() -> Self {
        Self {
            frame_interval_us: DEFAULT_FRAME_INTERVAL_US,
            fingers: 5,
            id_churn: 0.0,
            circle_gesture: false,
            seed: 11,
        }
    }
}

pub struct HandSimulator {
    config: HandSimConfig,
    path: NoisyTrajectory,
    rng: StdRng,
    frame_id: i64,
    hand_id: i64,
}

impl HandSimulator {
    pub fn new(path: NoisyTrajectory, config: HandSimConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        HandSimulator {
            config,
            path,
            rng,
            frame_id: 0,
            hand_id: 1,
        }
    }

    pub fn frame_id(&self) -> i64 {
        self.frame_id
    }

    pub fn hand_id(&self) -> i64 {
        self.hand_id
    }

    /// Seconds since the first frame, for the frame about to be generated
    pub fn elapsed_secs(&self) -> f64 {
        (self.frame_id * self.config.frame_interval_us) as f64 / 1e6
    }

    /// Next frame with the hand in view
    pub fn next_frame(&mut self) -> Value {
        let t = self.elapsed_secs();
        if self.frame_id > 0 && self.rng.gen_bool(self.config.id_churn.clamp(0.0, 1.0)) {
            self.hand_id += 1;
        }
        let palm = self.path.sample(t);
        let frame = hand_frame_json(
            self.frame_id + 1,
            self.frame_id * self.config.frame_interval_us,
            self.hand_id,
            palm,
            self.config.fingers,
        );
        let frame = if self.config.circle_gesture {
            with_circle(frame, self.hand_id, palm, t)
        } else {
            frame
        };
        self.frame_id += 1;
        frame
    }

    /// Next frame with no hands in view
    pub fn next_empty_frame(&mut self) -> Value {
        let frame = json!({
            "id": self.frame_id + 1,
            "timestamp": self.frame_id * self.config.frame_interval_us,
            "hands": [],
            "pointables": [],
            "gestures": [],
        });
        self.frame_id += 1;
        frame
    }

    pub fn next_message(&mut self) -> String {
        self.next_frame().to_string()
    }
}

/// One tracker frame holding a single right hand at `palm` with
/// `fingers` extended fingers
pub fn hand_frame_json(frame_id: i64, timestamp: i64, hand_id: i64, palm: Vec3, fingers: usize) -> Value {
    let pointables: Vec<Value> = (0..fingers.min(5))
        .map(|finger| {
            let tip = palm + Vec3::new(finger as f32 * 20.0 - 40.0, 60.0, 0.0);
            json!({
                "id": hand_id * 10 + finger as i64,
                "handId": hand_id,
                "type": finger,
                "tool": false,
                "tipPosition": tip.to_array(),
                "direction": [0.0, 1.0, 0.0],
                "length": 50.0,
            })
        })
        .collect();

    json!({
        "id": frame_id,
        "timestamp": timestamp,
        "hands": [{
            "id": hand_id,
            "type": "right",
            "palmPosition": palm.to_array(),
            "palmNormal": [0.0, -1.0, 0.0],
            "direction": [0.0, 0.0, -1.0],
        }],
        "pointables": pointables,
        "gestures": [],
    })
}

fn with_circle(mut frame: Value, hand_id: i64, center: Vec3, t: f64) -> Value {
    if let Some(gestures) = frame.get_mut("gestures").and_then(Value::as_array_mut) {
        gestures.push(json!({
            "id": 1,
            "type": "circle",
            "state": "update",
            "duration": (t * 1e6) as i64,
            "handIds": [hand_id],
            "pointableIds": [hand_id * 10 + 1],
            "center": center.to_array(),
            "normal": [0.0, 0.0, 1.0],
            "radius": 30.0,
            "progress": t,
        }));
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::Trajectory;
    use rigstream_core::EntityId;
    use rigstream_wire::HandMessageDecoder;

    fn still(at: Vec3, config: HandSimConfig) -> HandSimulator {
        HandSimulator::new(NoisyTrajectory::new(Trajectory::Still { at }, 0.0, 1), config)
    }

    #[test]
    fn test_frames_decode() {
        let palm = Vec3::new(0.0, 180.0, 10.0);
        let mut sim = still(
            palm,
            HandSimConfig {
                fingers: 2,
                circle_gesture: true,
                ..Default::default()
            },
        );
        let decoder = HandMessageDecoder;

        let frame = decoder.decode_str(&sim.next_message()).unwrap();
        assert_eq!(frame.frame_id, Some(1));
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].id, EntityId(1));
        assert_eq!(frame.hands[0].palm_position, palm);
        assert_eq!(frame.pointables.len(), 2);
        assert!(frame.pointables.iter().all(|p| p.hand_id == Some(EntityId(1))));
        assert_eq!(frame.gestures.len(), 1);

        let frame = decoder.decode_str(&sim.next_message()).unwrap();
        assert_eq!(frame.frame_id, Some(2));
        assert_eq!(frame.timestamp, Some(DEFAULT_FRAME_INTERVAL_US));
    }

    #[test]
    fn test_id_churn_changes_hand_id() {
        let mut sim = still(
            Vec3::ZERO,
            HandSimConfig {
                id_churn: 1.0,
                ..Default::default()
            },
        );
        sim.next_frame();
        assert_eq!(sim.hand_id(), 1);
        sim.next_frame();
        sim.next_frame();
        assert_eq!(sim.hand_id(), 3);
    }

    #[test]
    fn test_empty_frame() {
        let mut sim = still(Vec3::ZERO, HandSimConfig::default());
        sim.next_frame();
        let frame = HandMessageDecoder
            .decode_str(&sim.next_empty_frame().to_string())
            .unwrap();
        assert_eq!(frame.frame_id, Some(2));
        assert!(frame.hands.is_empty());
    }
}
