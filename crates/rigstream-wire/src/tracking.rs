//! Tracking-state protocol (face tracker)
//!
//! One UDP datagram holds one envelope block (id 33433) whose payload is a
//! u16 sub-block count followed by that many nested blocks. Nested blocks
//! are decoded by id; unknown ids are skipped using their declared size.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use rigstream_core::{BlendShape, DecodeError, EyeGaze, FaceFrame, Quat, Vec3};

use crate::{
    BlockHeader, BlockKind, ByteReader, ChannelLayout, BLOCK_BLENDSHAPES, BLOCK_EYES,
    BLOCK_FRAME_INFO, BLOCK_HEADER_SIZE, BLOCK_MARKERS, BLOCK_POSE, BLOCK_TRACKING_STATE,
    MAX_BLOCK_VERSION,
};

/// How nested blocks with a version above `MAX_BLOCK_VERSION` are handled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VersionPolicy {
    /// Skip the block via its size and keep decoding
    #[default]
    Lenient,
    /// Fail the whole message
    Strict,
}

/// Decoder for tracking-state messages
#[derive(Clone, Debug, Default)]
pub struct TrackingStateDecoder {
    layout: ChannelLayout,
    policy: VersionPolicy,
}

fn read_header(reader: &mut ByteReader<'_>) -> Result<BlockHeader, DecodeError> {
    let offset = reader.offset();
    BlockHeader::parse(reader.take(BLOCK_HEADER_SIZE)?, offset)
}

impl TrackingStateDecoder {
    pub fn new(layout: ChannelLayout) -> Self {
        TrackingStateDecoder {
            layout,
            policy: VersionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: VersionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Decode one datagram
    pub fn decode(&self, buf: &[u8]) -> Result<FaceFrame, DecodeError> {
        let mut reader = ByteReader::new(buf);
        let envelope = read_header(&mut reader)?;

        if envelope.block_id != BLOCK_TRACKING_STATE {
            return Err(DecodeError::MalformedHeader(format!(
                "expected tracking-state envelope {}, found block {}",
                BLOCK_TRACKING_STATE, envelope.block_id
            )));
        }
        if envelope.version > MAX_BLOCK_VERSION {
            return Err(DecodeError::UnsupportedVersion {
                block_id: envelope.block_id,
                version: envelope.version,
            });
        }

        let mut body = reader.sub_reader(envelope.block_size as usize)?;
        let count = body.read_u16()?;
        let mut frame = FaceFrame::default();

        for _ in 0..count {
            let block = read_header(&mut body)?;
            let mut payload = body.sub_reader(block.block_size as usize)?;

            if block.version > MAX_BLOCK_VERSION {
                match self.policy {
                    VersionPolicy::Strict => {
                        return Err(DecodeError::UnsupportedVersion {
                            block_id: block.block_id,
                            version: block.version,
                        })
                    }
                    VersionPolicy::Lenient => {
                        debug!(
                            block_id = block.block_id,
                            version = block.version,
                            "skipping block with unsupported version"
                        );
                        continue;
                    }
                }
            }

            self.decode_block(block.kind(), &mut payload, &mut frame)?;
        }

        Ok(frame)
    }

    fn decode_block(
        &self,
        kind: BlockKind,
        payload: &mut ByteReader<'_>,
        frame: &mut FaceFrame,
    ) -> Result<(), DecodeError> {
        match kind {
            BlockKind::FrameInfo => {
                frame.timestamp = Some(payload.read_f64()?);
                frame.tracking_ok = payload.read_u8()? != 0;
            }
            BlockKind::Pose => {
                let x = payload.read_f32()?;
                let y = payload.read_f32()?;
                let z = payload.read_f32()?;
                let w = payload.read_f32()?;
                frame.head_rotation = Some(Quat::from_xyzw(x, y, z, w));
                if payload.remaining() >= 12 {
                    frame.head_translation = Some(read_vec3(payload)?);
                }
            }
            BlockKind::Blendshapes => {
                let count = payload.read_u32()? as usize;
                let mut shapes = Vec::with_capacity(count.min(payload.remaining() / 4));
                for i in 0..count {
                    let value = payload.read_f32()?;
                    shapes.push(BlendShape {
                        name: self.layout.name(i),
                        value,
                    });
                }
                frame.blend_shapes = shapes;
            }
            BlockKind::Eyes => {
                frame.eye_gaze = Some(EyeGaze {
                    left_theta: payload.read_f32()?,
                    left_phi: payload.read_f32()?,
                    right_theta: payload.read_f32()?,
                    right_phi: payload.read_f32()?,
                });
            }
            BlockKind::Markers => {
                let count = payload.read_u16()? as usize;
                let mut markers = Vec::with_capacity(count.min(payload.remaining() / 12));
                for _ in 0..count {
                    markers.push(read_vec3(payload)?);
                }
                frame.markers = markers;
            }
            BlockKind::TrackingState | BlockKind::Unknown(_) => {
                debug!(block_id = kind.id(), "skipping unknown block");
            }
        }
        Ok(())
    }
}

fn read_vec3(reader: &mut ByteReader<'_>) -> Result<Vec3, DecodeError> {
    Ok(Vec3::new(
        reader.read_f32()?,
        reader.read_f32()?,
        reader.read_f32()?,
    ))
}

/// Encoder producing tracking-state messages bit-exact with the tracker
#[derive(Clone, Debug, Default)]
pub struct TrackingStateBuilder {
    envelope_version: u16,
    blocks: Vec<(BlockHeader, Vec<u8>)>,
}

impl TrackingStateBuilder {
    pub fn new() -> Self {
        TrackingStateBuilder {
            envelope_version: MAX_BLOCK_VERSION,
            blocks: Vec::new(),
        }
    }

    /// Builder pre-filled with every block `frame` has data for
    pub fn from_frame(frame: &FaceFrame) -> Self {
        let mut builder = TrackingStateBuilder::new()
            .frame_info(frame.timestamp.unwrap_or(0.0), frame.tracking_ok);
        if let Some(rotation) = frame.head_rotation {
            builder = match frame.head_translation {
                Some(t) => builder.head_pose_with_translation(rotation, t),
                None => builder.head_pose(rotation),
            };
        }
        let values: Vec<f32> = frame.blend_shapes.iter().map(|b| b.value).collect();
        builder = builder.blend_shapes(&values);
        if let Some(gaze) = frame.eye_gaze {
            builder = builder.eyes(gaze);
        }
        builder.markers(&frame.markers)
    }

    pub fn envelope_version(mut self, version: u16) -> Self {
        self.envelope_version = version;
        self
    }

    pub fn frame_info(self, timestamp: f64, tracking_ok: bool) -> Self {
        let mut p = Vec::with_capacity(9);
        p.extend_from_slice(&timestamp.to_le_bytes());
        p.push(tracking_ok as u8);
        self.raw_block(BLOCK_FRAME_INFO, MAX_BLOCK_VERSION, p)
    }

    pub fn head_pose(self, rotation: Quat) -> Self {
        let mut p = Vec::with_capacity(16);
        for v in [rotation.x, rotation.y, rotation.z, rotation.w] {
            p.extend_from_slice(&v.to_le_bytes());
        }
        self.raw_block(BLOCK_POSE, MAX_BLOCK_VERSION, p)
    }

    pub fn head_pose_with_translation(self, rotation: Quat, translation: Vec3) -> Self {
        let mut p = Vec::with_capacity(28);
        for v in [
            rotation.x,
            rotation.y,
            rotation.z,
            rotation.w,
            translation.x,
            translation.y,
            translation.z,
        ] {
            p.extend_from_slice(&v.to_le_bytes());
        }
        self.raw_block(BLOCK_POSE, MAX_BLOCK_VERSION, p)
    }

    pub fn blend_shapes(self, values: &[f32]) -> Self {
        let mut p = Vec::with_capacity(4 + values.len() * 4);
        p.extend_from_slice(&(values.len() as u32).to_le_bytes());
        for v in values {
            p.extend_from_slice(&v.to_le_bytes());
        }
        self.raw_block(BLOCK_BLENDSHAPES, MAX_BLOCK_VERSION, p)
    }

    pub fn eyes(self, gaze: EyeGaze) -> Self {
        let mut p = Vec::with_capacity(16);
        for v in [
            gaze.left_theta,
            gaze.left_phi,
            gaze.right_theta,
            gaze.right_phi,
        ] {
            p.extend_from_slice(&v.to_le_bytes());
        }
        self.raw_block(BLOCK_EYES, MAX_BLOCK_VERSION, p)
    }

    pub fn markers(self, markers: &[Vec3]) -> Self {
        let mut p = Vec::with_capacity(2 + markers.len() * 12);
        p.extend_from_slice(&(markers.len() as u16).to_le_bytes());
        for m in markers {
            for v in m.to_array() {
                p.extend_from_slice(&v.to_le_bytes());
            }
        }
        self.raw_block(BLOCK_MARKERS, MAX_BLOCK_VERSION, p)
    }

    /// Append an arbitrary nested block
    pub fn raw_block(mut self, block_id: u16, version: u16, payload: Vec<u8>) -> Self {
        let header = BlockHeader {
            block_id,
            version,
            block_size: payload.len() as u32,
        };
        self.blocks.push((header, payload));
        self
    }

    fn body_len(&self) -> usize {
        2 + self
            .blocks
            .iter()
            .map(|(_, p)| BLOCK_HEADER_SIZE + p.len())
            .sum::<usize>()
    }

    /// Byte offsets at which a block or the sub-block count ends
    pub fn block_boundaries(&self) -> Vec<usize> {
        let mut out = vec![BLOCK_HEADER_SIZE, BLOCK_HEADER_SIZE + 2];
        let mut offset = BLOCK_HEADER_SIZE + 2;
        for (_, payload) in &self.blocks {
            offset += BLOCK_HEADER_SIZE;
            out.push(offset);
            offset += payload.len();
            out.push(offset);
        }
        out
    }

    pub fn build(&self) -> Bytes {
        let body_len = self.body_len();
        let mut buf = BytesMut::with_capacity(BLOCK_HEADER_SIZE + body_len);
        let envelope = BlockHeader {
            block_id: BLOCK_TRACKING_STATE,
            version: self.envelope_version,
            block_size: body_len as u32,
        };
        buf.put_slice(&envelope.to_bytes());
        buf.put_u16_le(self.blocks.len() as u16);
        for (header, payload) in &self.blocks {
            buf.put_slice(&header.to_bytes());
            buf.put_slice(payload);
        }
        buf.freeze()
    }
}
