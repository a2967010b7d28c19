//! Hand tracker protocol (JSON)
//!
//! One JSON object per message. Top-level collections that are missing or
//! null decode as empty, and a single malformed entity is dropped without
//! failing the rest of the frame. Only a payload that is not a JSON object
//! at all is an error.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use rigstream_core::{
    DecodeError, EntityId, FingerKind, Gesture, GestureKind, GestureState, Hand, HandFrame,
    HandSide, Pointable, Vec3,
};

/// Largest message the forwarder relays, bytes
pub const MAX_HAND_MESSAGE_SIZE: usize = 10_000;

#[derive(Debug, Default, Deserialize)]
struct WireFrame {
    id: Option<i64>,
    timestamp: Option<i64>,
    hands: Option<Vec<Value>>,
    pointables: Option<Vec<Value>>,
    gestures: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireHand {
    id: i64,
    #[serde(rename = "type")]
    side: Option<String>,
    palm_position: Option<[f32; 3]>,
    palm_normal: Option<[f32; 3]>,
    direction: Option<[f32; 3]>,
    elbow: Option<[f32; 3]>,
    wrist: Option<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePointable {
    id: i64,
    hand_id: Option<i64>,
    #[serde(rename = "type")]
    finger: Option<i64>,
    #[serde(default)]
    tool: bool,
    tip_position: Option<[f32; 3]>,
    direction: Option<[f32; 3]>,
    length: Option<f32>,
    btip_position: Option<[f32; 3]>,
    mcp_position: Option<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGesture {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
    state: Option<String>,
    duration: Option<i64>,
    normal: Option<[f32; 3]>,
    #[serde(default)]
    pointable_ids: Vec<i64>,
    #[serde(default)]
    hand_ids: Vec<i64>,
    center: Option<[f32; 3]>,
    radius: Option<f32>,
    progress: Option<f32>,
}

fn vec3(v: Option<[f32; 3]>) -> Vec3 {
    v.map(Vec3::from).unwrap_or_default()
}

impl From<WireHand> for Hand {
    fn from(w: WireHand) -> Self {
        let side = match w.side.as_deref() {
            Some("left") => Some(HandSide::Left),
            Some("right") => Some(HandSide::Right),
            _ => None,
        };
        Hand {
            id: EntityId(w.id),
            side,
            palm_position: vec3(w.palm_position),
            palm_normal: vec3(w.palm_normal),
            direction: vec3(w.direction),
            elbow: w.elbow.map(Vec3::from),
            wrist: w.wrist.map(Vec3::from),
        }
    }
}

impl From<WirePointable> for Pointable {
    fn from(w: WirePointable) -> Self {
        Pointable {
            id: EntityId(w.id),
            // -1 means "not attached to any hand"
            hand_id: w.hand_id.filter(|id| *id >= 0).map(EntityId),
            finger: w.finger.and_then(FingerKind::from_index),
            tool: w.tool,
            tip_position: vec3(w.tip_position),
            direction: vec3(w.direction),
            length: w.length.unwrap_or(0.0),
            btip_position: w.btip_position.map(Vec3::from),
            mcp_position: w.mcp_position.map(Vec3::from),
        }
    }
}

impl From<WireGesture> for Gesture {
    fn from(w: WireGesture) -> Self {
        Gesture {
            id: EntityId(w.id),
            kind: GestureKind::parse(&w.kind),
            state: w.state.as_deref().and_then(GestureState::parse),
            duration: w.duration.unwrap_or(0),
            normal: w.normal.map(Vec3::from),
            pointable_ids: w.pointable_ids.into_iter().map(EntityId).collect(),
            hand_ids: w.hand_ids.into_iter().map(EntityId).collect(),
            center: w.center.map(Vec3::from),
            radius: w.radius,
            progress: w.progress,
        }
    }
}

fn entities<W, T>(values: Option<Vec<Value>>, what: &'static str) -> Vec<T>
where
    W: DeserializeOwned,
    T: From<W>,
{
    values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<W>(v) {
            Ok(w) => Some(T::from(w)),
            Err(e) => {
                debug!(kind = what, error = %e, "dropping malformed entity");
                None
            }
        })
        .collect()
}

/// Decoder for hand tracker messages
#[derive(Clone, Copy, Debug, Default)]
pub struct HandMessageDecoder;

impl HandMessageDecoder {
    pub fn decode(&self, payload: &[u8]) -> Result<HandFrame, DecodeError> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| DecodeError::MalformedMessage(format!("invalid utf-8: {}", e)))?;
        self.decode_str(text)
    }

    pub fn decode_str(&self, text: &str) -> Result<HandFrame, DecodeError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| DecodeError::MalformedMessage(e.to_string()))?;
        if !value.is_object() {
            return Err(DecodeError::MalformedMessage(
                "expected a JSON object".to_string(),
            ));
        }
        let wire: WireFrame = serde_json::from_value(value)
            .map_err(|e| DecodeError::MalformedMessage(e.to_string()))?;

        Ok(HandFrame {
            frame_id: wire.id,
            timestamp: wire.timestamp,
            hands: entities::<WireHand, Hand>(wire.hands, "hand"),
            pointables: entities::<WirePointable, Pointable>(wire.pointables, "pointable"),
            gestures: entities::<WireGesture, Gesture>(wire.gestures, "gesture"),
        })
    }
}

/// Request sent after connecting to ask for gesture recognition
pub fn enable_gestures_request() -> String {
    serde_json::json!({ "enableGestures": "true" }).to_string()
}

/// Request sent by protocol v2 clients to receive frames while unfocused
pub fn focus_request() -> String {
    serde_json::json!({ "focused": "true" }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": 4021,
        "timestamp": 88812345,
        "hands": [
            {"id": 12, "type": "right", "palmPosition": [10.0, 200.0, -5.0],
             "palmNormal": [0.0, -1.0, 0.0], "direction": [0.0, 0.0, -1.0],
             "elbow": [0.0, 0.0, 300.0], "wrist": [5.0, 180.0, 40.0]}
        ],
        "pointables": [
            {"id": 120, "handId": 12, "type": 1, "tool": false,
             "tipPosition": [12.0, 260.0, -40.0], "direction": [0.0, 0.2, -0.9],
             "length": 52.5, "btipPosition": [12.0, 258.0, -38.0], "mcpPosition": [11.0, 210.0, -10.0]},
            {"id": 999, "handId": -1, "type": 0, "tool": false, "tipPosition": [0.0, 0.0, 0.0]}
        ],
        "gestures": [
            {"id": 7, "type": "circle", "state": "update", "duration": 150000,
             "normal": [0.0, 0.0, 1.0], "pointableIds": [120], "handIds": [12],
             "center": [0.0, 220.0, 0.0], "radius": 30.0, "progress": 1.25},
            {"id": 8, "type": "swipe", "state": "start", "duration": 0, "pointableIds": []}
        ],
        "interactionBox": {"center": [0, 200, 0]}
    }"#;

    #[test]
    fn test_decode_full_message() {
        let frame = HandMessageDecoder.decode_str(SAMPLE).unwrap();
        assert_eq!(frame.frame_id, Some(4021));
        assert_eq!(frame.timestamp, Some(88812345));

        let hand = &frame.hands[0];
        assert_eq!(hand.id, EntityId(12));
        assert_eq!(hand.side, Some(HandSide::Right));
        assert_eq!(hand.palm_position, Vec3::new(10.0, 200.0, -5.0));
        assert_eq!(hand.wrist, Some(Vec3::new(5.0, 180.0, 40.0)));

        assert_eq!(frame.pointables.len(), 2);
        assert_eq!(frame.pointables[0].hand_id, Some(EntityId(12)));
        assert_eq!(frame.pointables[0].finger, Some(FingerKind::Index));
        assert_eq!(frame.pointables[0].length, 52.5);
        assert_eq!(frame.pointables[1].hand_id, None);

        let circle = &frame.gestures[0];
        assert!(circle.is_circle());
        assert_eq!(circle.state, Some(GestureState::Update));
        assert_eq!(circle.pointable_ids, vec![EntityId(120)]);
        assert_eq!(circle.progress, Some(1.25));
        assert_eq!(frame.gestures[1].kind, GestureKind::Swipe);
    }

    #[test]
    fn test_missing_collections_are_empty() {
        let frame = HandMessageDecoder.decode_str(r#"{"id": 5}"#).unwrap();
        assert!(frame.is_empty());
        assert_eq!(frame.frame_id, Some(5));

        let frame = HandMessageDecoder
            .decode_str(r#"{"hands": null, "pointables": []}"#)
            .unwrap();
        assert!(frame.is_empty());
        assert_eq!(frame.frame_id, None);
    }

    #[test]
    fn test_version_greeting_has_no_frame_id() {
        let frame = HandMessageDecoder
            .decode_str(r#"{"serviceVersion": "2.3.1", "version": 6}"#)
            .unwrap();
        assert_eq!(frame.frame_id, None);
        assert!(frame.is_empty());
    }

    #[test]
    fn test_malformed_entity_dropped() {
        let frame = HandMessageDecoder
            .decode_str(r#"{"id": 1, "hands": [{"type": "left"}, {"id": 3}]}"#)
            .unwrap();
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].id, EntityId(3));
        assert_eq!(frame.hands[0].palm_position, Vec3::ZERO);
    }

    #[test]
    fn test_not_an_object_is_malformed() {
        for text in ["[1, 2]", "not json", "", "42"] {
            assert!(matches!(
                HandMessageDecoder.decode_str(text),
                Err(DecodeError::MalformedMessage(_))
            ));
        }
        assert!(matches!(
            HandMessageDecoder.decode(&[0xFF, 0xFE]),
            Err(DecodeError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_control_requests() {
        let v: Value = serde_json::from_str(&enable_gestures_request()).unwrap();
        assert_eq!(v["enableGestures"], "true");
        let v: Value = serde_json::from_str(&focus_request()).unwrap();
        assert_eq!(v["focused"], "true");
    }
}
