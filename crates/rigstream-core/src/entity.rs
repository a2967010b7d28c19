//! Transient tracked entities: hands, pointables and gestures
//!
//! Entity ids are only meaningful for the lifetime of one tracker
//! connection and get reused. Nothing here assumes they are stable.

use std::fmt;

use crate::Vec3;

/// Process-local tracker id
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub i64);

impl EntityId {
    #[inline]
    pub fn new(id: i64) -> Self {
        EntityId(id)
    }

    #[inline]
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which hand the tracker believes it sees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandSide {
    Left,
    Right,
}

/// One tracked hand
#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    pub id: EntityId,
    pub side: Option<HandSide>,
    pub palm_position: Vec3,
    pub palm_normal: Vec3,
    pub direction: Vec3,
    pub elbow: Option<Vec3>,
    pub wrist: Option<Vec3>,
}

impl Hand {
    pub fn new(id: EntityId, palm_position: Vec3) -> Self {
        Hand {
            id,
            side: None,
            palm_position,
            palm_normal: Vec3::ZERO,
            direction: Vec3::ZERO,
            elbow: None,
            wrist: None,
        }
    }
}

/// Anatomical finger, numbered 0 (thumb) to 4 (pinky) on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FingerKind {
    Thumb = 0,
    Index = 1,
    Middle = 2,
    Ring = 3,
    Pinky = 4,
}

impl FingerKind {
    pub fn from_index(i: i64) -> Option<Self> {
        match i {
            0 => Some(FingerKind::Thumb),
            1 => Some(FingerKind::Index),
            2 => Some(FingerKind::Middle),
            3 => Some(FingerKind::Ring),
            4 => Some(FingerKind::Pinky),
            _ => None,
        }
    }
}

/// A finger or a hand-held tool
#[derive(Debug, Clone, PartialEq)]
pub struct Pointable {
    pub id: EntityId,
    /// None when the tracker could not attach it to a hand
    pub hand_id: Option<EntityId>,
    pub finger: Option<FingerKind>,
    pub tool: bool,
    pub tip_position: Vec3,
    pub direction: Vec3,
    pub length: f32,
    pub btip_position: Option<Vec3>,
    pub mcp_position: Option<Vec3>,
}

impl Pointable {
    pub fn new(id: EntityId, hand_id: Option<EntityId>, tip_position: Vec3) -> Self {
        Pointable {
            id,
            hand_id,
            finger: None,
            tool: false,
            tip_position,
            direction: Vec3::ZERO,
            length: 0.0,
            btip_position: None,
            mcp_position: None,
        }
    }
}

/// Gesture type as reported by the tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureKind {
    Circle,
    Swipe,
    KeyTap,
    ScreenTap,
    Other(String),
}

impl GestureKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "circle" => GestureKind::Circle,
            "swipe" => GestureKind::Swipe,
            "keyTap" => GestureKind::KeyTap,
            "screenTap" => GestureKind::ScreenTap,
            other => GestureKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Start,
    Update,
    Stop,
}

impl GestureState {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start" => Some(GestureState::Start),
            "update" => Some(GestureState::Update),
            "stop" => Some(GestureState::Stop),
            _ => None,
        }
    }
}

/// A recognised gesture
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    pub id: EntityId,
    pub kind: GestureKind,
    pub state: Option<GestureState>,
    /// Microseconds since the gesture started
    pub duration: i64,
    pub normal: Option<Vec3>,
    pub pointable_ids: Vec<EntityId>,
    pub hand_ids: Vec<EntityId>,
    /// Circle gestures only
    pub center: Option<Vec3>,
    pub radius: Option<f32>,
    pub progress: Option<f32>,
}

impl Gesture {
    pub fn new(id: EntityId, kind: GestureKind) -> Self {
        Gesture {
            id,
            kind,
            state: None,
            duration: 0,
            normal: None,
            pointable_ids: Vec::new(),
            hand_ids: Vec::new(),
            center: None,
            radius: None,
            progress: None,
        }
    }

    pub fn is_circle(&self) -> bool {
        self.kind == GestureKind::Circle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gesture_kind_parse() {
        assert_eq!(GestureKind::parse("circle"), GestureKind::Circle);
        assert_eq!(GestureKind::parse("keyTap"), GestureKind::KeyTap);
        assert_eq!(
            GestureKind::parse("wave"),
            GestureKind::Other("wave".to_string())
        );
        assert!(Gesture::new(EntityId(3), GestureKind::Circle).is_circle());
    }

    #[test]
    fn test_finger_index() {
        assert_eq!(FingerKind::from_index(0), Some(FingerKind::Thumb));
        assert_eq!(FingerKind::from_index(4), Some(FingerKind::Pinky));
        assert_eq!(FingerKind::from_index(5), None);
    }
}
