//! Body tracker protocol (OSC)
//!
//! Inbound:
//! - `/kinect2/joint` `[joint_id, x, y, z, qw, qx, qy, qz, confidence]`
//! - `/kinect2/here_I_am` discovery reply
//! - `/kinect2/pose` `[name]`
//!
//! Outbound:
//! - `/kinect2/where_are_you` broadcast discovery
//! - `/kinect2/send_me_info` `[user_position]`

use rosc::{decoder, encoder, OscMessage, OscPacket, OscType};
use tracing::debug;

use rigstream_core::{DecodeError, JointSample, Quat, Vec3};

pub const ADDR_JOINT: &str = "/kinect2/joint";
pub const ADDR_HERE_I_AM: &str = "/kinect2/here_I_am";
pub const ADDR_POSE: &str = "/kinect2/pose";
pub const ADDR_WHERE_ARE_YOU: &str = "/kinect2/where_are_you";
pub const ADDR_SEND_ME_INFO: &str = "/kinect2/send_me_info";

/// Port the body tracker server listens on
pub const BODY_SERVER_PORT: u16 = 10750;
/// Port the client listens on
pub const BODY_LOCAL_PORT: u16 = 10751;

/// Which tracked user the server should stream
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UserPosition {
    #[default]
    ClosestToCenter,
    FirstLeftFromCenter,
    FirstRightFromCenter,
}

impl UserPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            UserPosition::ClosestToCenter => "CLOSEST_TO_CENTER",
            UserPosition::FirstLeftFromCenter => "FIRST_LEFT_FROM_CENTER",
            UserPosition::FirstRightFromCenter => "FIRST_RIGHT_FROM_CENTER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CLOSEST_TO_CENTER" => Some(UserPosition::ClosestToCenter),
            "FIRST_LEFT_FROM_CENTER" => Some(UserPosition::FirstLeftFromCenter),
            "FIRST_RIGHT_FROM_CENTER" => Some(UserPosition::FirstRightFromCenter),
            _ => None,
        }
    }
}

/// One decoded inbound body message
#[derive(Clone, Debug, PartialEq)]
pub enum BodyMessage {
    Joint { joint_id: i32, sample: JointSample },
    ServerHere,
    Pose(String),
}

fn as_f32(arg: &OscType) -> Option<f32> {
    match arg {
        OscType::Float(v) => Some(*v),
        OscType::Double(v) => Some(*v as f32),
        OscType::Int(v) => Some(*v as f32),
        OscType::Long(v) => Some(*v as f32),
        _ => None,
    }
}

fn decode_joint(args: &[OscType]) -> Result<BodyMessage, DecodeError> {
    if args.len() < 9 {
        return Err(DecodeError::MalformedMessage(format!(
            "joint message has {} arguments, expected 9",
            args.len()
        )));
    }
    let joint_id = match args[0] {
        OscType::Int(id) => id,
        OscType::Long(id) => id as i32,
        _ => {
            return Err(DecodeError::MalformedMessage(
                "joint id is not an integer".to_string(),
            ))
        }
    };
    let mut v = [0f32; 8];
    for (slot, arg) in v.iter_mut().zip(&args[1..9]) {
        *slot = as_f32(arg).ok_or_else(|| {
            DecodeError::MalformedMessage(format!("non-numeric joint argument {:?}", arg))
        })?;
    }
    Ok(BodyMessage::Joint {
        joint_id,
        sample: JointSample {
            position: Vec3::new(v[0], v[1], v[2]),
            rotation: Quat::new(v[3], v[4], v[5], v[6]),
            confidence: v[7],
        },
    })
}

fn decode_message(msg: &OscMessage, out: &mut Vec<BodyMessage>) -> Result<(), DecodeError> {
    match msg.addr.as_str() {
        ADDR_JOINT => out.push(decode_joint(&msg.args)?),
        ADDR_HERE_I_AM => out.push(BodyMessage::ServerHere),
        ADDR_POSE => match msg.args.first() {
            Some(OscType::String(name)) => out.push(BodyMessage::Pose(name.clone())),
            _ => {
                return Err(DecodeError::MalformedMessage(
                    "pose message without a name".to_string(),
                ))
            }
        },
        other => debug!(addr = other, "ignoring OSC message"),
    }
    Ok(())
}

fn flatten(packet: &OscPacket, out: &mut Vec<BodyMessage>) -> Result<(), DecodeError> {
    match packet {
        OscPacket::Message(msg) => decode_message(msg, out),
        OscPacket::Bundle(bundle) => {
            for inner in &bundle.content {
                flatten(inner, out)?;
            }
            Ok(())
        }
    }
}

/// Decode one datagram; bundles are flattened in order
pub fn decode_body_packet(buf: &[u8]) -> Result<Vec<BodyMessage>, DecodeError> {
    let (_, packet) =
        decoder::decode_udp(buf).map_err(|e| DecodeError::MalformedMessage(format!("{:?}", e)))?;
    let mut out = Vec::new();
    flatten(&packet, &mut out)?;
    Ok(out)
}

fn encode(addr: &str, args: Vec<OscType>) -> Result<Vec<u8>, DecodeError> {
    let packet = OscPacket::Message(OscMessage {
        addr: addr.to_string(),
        args,
    });
    encoder::encode(&packet).map_err(|e| DecodeError::MalformedMessage(format!("{:?}", e)))
}

/// Broadcast discovery request
pub fn where_are_you() -> Result<Vec<u8>, DecodeError> {
    encode(ADDR_WHERE_ARE_YOU, Vec::new())
}

/// Subscription request for one tracked user
pub fn send_me_info(position: UserPosition) -> Result<Vec<u8>, DecodeError> {
    encode(
        ADDR_SEND_ME_INFO,
        vec![OscType::String(position.as_str().to_string())],
    )
}

/// Encode a joint message the way the server does
pub fn encode_joint(joint_id: i32, sample: &JointSample) -> Result<Vec<u8>, DecodeError> {
    let p = sample.position;
    let q = sample.rotation;
    encode(
        ADDR_JOINT,
        vec![
            OscType::Int(joint_id),
            OscType::Float(p.x),
            OscType::Float(p.y),
            OscType::Float(p.z),
            OscType::Float(q.w),
            OscType::Float(q.x),
            OscType::Float(q.y),
            OscType::Float(q.z),
            OscType::Float(sample.confidence),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{OscBundle, OscTime};

    fn joint() -> JointSample {
        JointSample {
            position: Vec3::new(0.1, 1.2, 2.5),
            rotation: Quat::new(1.0, 0.0, 0.0, 0.0),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_joint_message() {
        let bytes = encode_joint(3, &joint()).unwrap();
        let msgs = decode_body_packet(&bytes).unwrap();
        assert_eq!(
            msgs,
            vec![BodyMessage::Joint {
                joint_id: 3,
                sample: joint()
            }]
        );
    }

    #[test]
    fn test_integer_confidence() {
        let mut args = vec![OscType::Int(7)];
        args.extend((0..7).map(|_| OscType::Float(0.5)));
        args.push(OscType::Int(2));
        let bytes = encode(ADDR_JOINT, args).unwrap();
        match &decode_body_packet(&bytes).unwrap()[0] {
            BodyMessage::Joint { joint_id, sample } => {
                assert_eq!(*joint_id, 7);
                assert_eq!(sample.confidence, 2.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bundle_flattened() {
        let packet = OscPacket::Bundle(OscBundle {
            timetag: OscTime {
                seconds: 0,
                fractional: 1,
            },
            content: vec![
                OscPacket::Message(OscMessage {
                    addr: ADDR_HERE_I_AM.to_string(),
                    args: vec![],
                }),
                OscPacket::Message(OscMessage {
                    addr: ADDR_POSE.to_string(),
                    args: vec![OscType::String("T_POSE".to_string())],
                }),
                OscPacket::Message(OscMessage {
                    addr: "/kinect2/unrelated".to_string(),
                    args: vec![],
                }),
            ],
        });
        let bytes = encoder::encode(&packet).unwrap();
        let msgs = decode_body_packet(&bytes).unwrap();
        assert_eq!(
            msgs,
            vec![BodyMessage::ServerHere, BodyMessage::Pose("T_POSE".into())]
        );
    }

    #[test]
    fn test_short_joint_is_malformed() {
        let bytes = encode(ADDR_JOINT, vec![OscType::Int(1), OscType::Float(0.0)]).unwrap();
        assert!(matches!(
            decode_body_packet(&bytes),
            Err(DecodeError::MalformedMessage(_))
        ));
        assert!(decode_body_packet(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_outbound_messages() {
        let bytes = send_me_info(UserPosition::FirstLeftFromCenter).unwrap();
        let (_, packet) = decoder::decode_udp(&bytes).unwrap();
        match packet {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, ADDR_SEND_ME_INFO);
                assert_eq!(
                    msg.args,
                    vec![OscType::String("FIRST_LEFT_FROM_CENTER".to_string())]
                );
            }
            _ => panic!("expected a message"),
        }
        assert!(!where_are_you().unwrap().is_empty());
        assert_eq!(
            UserPosition::parse("CLOSEST_TO_CENTER"),
            Some(UserPosition::ClosestToCenter)
        );
    }
}
