//! Decoded frames
//!
//! A frame is an immutable snapshot of one wire message. The receiver that
//! decoded it hands it over whole; nothing downstream mutates it.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::{EntityId, Gesture, Hand, Pointable, Quat, Vec3};

/// One named face channel intensity, nominally in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct BlendShape {
    pub name: Cow<'static, str>,
    pub value: f32,
}

impl BlendShape {
    pub fn new(name: impl Into<Cow<'static, str>>, value: f32) -> Self {
        BlendShape {
            name: name.into(),
            value,
        }
    }
}

/// Eye angles in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EyeGaze {
    pub left_theta: f32,
    pub left_phi: f32,
    pub right_theta: f32,
    pub right_phi: f32,
}

/// Face tracker state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceFrame {
    /// Tracker timestamp, seconds
    pub timestamp: Option<f64>,
    pub tracking_ok: bool,
    pub head_rotation: Option<Quat>,
    pub head_translation: Option<Vec3>,
    /// Channel intensities in wire order
    pub blend_shapes: Vec<BlendShape>,
    pub eye_gaze: Option<EyeGaze>,
    pub markers: Vec<Vec3>,
}

impl FaceFrame {
    /// Channel `(name, intensity)` pairs in wire order
    pub fn channels(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        self.blend_shapes.iter().map(|b| (b.name.as_ref(), b.value))
    }

    pub fn blend_shape(&self, name: &str) -> Option<f32> {
        self.blend_shapes
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.value)
    }
}

/// Hand tracker state for one message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandFrame {
    /// Tracker frame id; absent on protocol greeting messages
    pub frame_id: Option<i64>,
    /// Tracker timestamp, microseconds
    pub timestamp: Option<i64>,
    pub hands: Vec<Hand>,
    pub pointables: Vec<Pointable>,
    pub gestures: Vec<Gesture>,
}

impl HandFrame {
    pub fn hand(&self, id: EntityId) -> Option<&Hand> {
        self.hands.iter().find(|h| h.id == id)
    }

    pub fn pointables_of(&self, hand: EntityId) -> impl Iterator<Item = &Pointable> + '_ {
        self.pointables
            .iter()
            .filter(move |p| p.hand_id == Some(hand))
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty() && self.pointables.is_empty() && self.gestures.is_empty()
    }
}

/// One body joint sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSample {
    pub position: Vec3,
    pub rotation: Quat,
    pub confidence: f32,
}

/// Accumulated body tracker state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointFrame {
    pub joints: BTreeMap<i32, JointSample>,
    /// Last named pose reported by the tracker
    pub pose: Option<String>,
}

/// Any decoded frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Face(FaceFrame),
    Hand(HandFrame),
    Joint(JointFrame),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_channels_order() {
        let frame = FaceFrame {
            blend_shapes: vec![
                BlendShape::new("EyeBlink_L", 0.25),
                BlendShape::new("JawOpen", 1.0),
            ],
            ..Default::default()
        };
        let names: Vec<_> = frame.channels().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["EyeBlink_L", "JawOpen"]);
        assert_eq!(frame.blend_shape("JawOpen"), Some(1.0));
        assert_eq!(frame.blend_shape("Puff"), None);
    }

    #[test]
    fn test_hand_frame_lookup() {
        let mut frame = HandFrame::default();
        assert!(frame.is_empty());
        frame.hands.push(Hand::new(EntityId(7), Vec3::ZERO));
        frame
            .pointables
            .push(Pointable::new(EntityId(70), Some(EntityId(7)), Vec3::ZERO));
        frame
            .pointables
            .push(Pointable::new(EntityId(71), None, Vec3::ZERO));
        assert!(frame.hand(EntityId(7)).is_some());
        assert!(frame.hand(EntityId(8)).is_none());
        assert_eq!(frame.pointables_of(EntityId(7)).count(), 1);
    }
}
