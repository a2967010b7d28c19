//! Block header for the tracking-state protocol
//!
//! Every block starts with an 8 byte header:
//! - Bytes 0-1: Block id (LE)
//! - Bytes 2-3: Block version (LE)
//! - Bytes 4-7: Payload size in bytes, header excluded (LE)

use rigstream_core::DecodeError;

/// Block header size in bytes
pub const BLOCK_HEADER_SIZE: usize = 8;

/// Highest block version this decoder understands
pub const MAX_BLOCK_VERSION: u16 = 1;

/// Envelope id, also the tracker's default UDP port
pub const BLOCK_TRACKING_STATE: u16 = 33433;
pub const BLOCK_FRAME_INFO: u16 = 101;
pub const BLOCK_POSE: u16 = 102;
pub const BLOCK_BLENDSHAPES: u16 = 103;
pub const BLOCK_EYES: u16 = 104;
pub const BLOCK_MARKERS: u16 = 105;

/// Known block kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    TrackingState,
    FrameInfo,
    Pose,
    Blendshapes,
    Eyes,
    Markers,
    Unknown(u16),
}

impl BlockKind {
    pub fn from_id(id: u16) -> Self {
        match id {
            BLOCK_TRACKING_STATE => BlockKind::TrackingState,
            BLOCK_FRAME_INFO => BlockKind::FrameInfo,
            BLOCK_POSE => BlockKind::Pose,
            BLOCK_BLENDSHAPES => BlockKind::Blendshapes,
            BLOCK_EYES => BlockKind::Eyes,
            BLOCK_MARKERS => BlockKind::Markers,
            other => BlockKind::Unknown(other),
        }
    }

    pub fn id(self) -> u16 {
        match self {
            BlockKind::TrackingState => BLOCK_TRACKING_STATE,
            BlockKind::FrameInfo => BLOCK_FRAME_INFO,
            BlockKind::Pose => BLOCK_POSE,
            BlockKind::Blendshapes => BLOCK_BLENDSHAPES,
            BlockKind::Eyes => BLOCK_EYES,
            BlockKind::Markers => BLOCK_MARKERS,
            BlockKind::Unknown(id) => id,
        }
    }
}

/// Block header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub block_id: u16,
    pub version: u16,
    /// Payload bytes following the header
    pub block_size: u32,
}

impl BlockHeader {
    pub fn new(kind: BlockKind, block_size: u32) -> Self {
        BlockHeader {
            block_id: kind.id(),
            version: MAX_BLOCK_VERSION,
            block_size,
        }
    }

    #[inline]
    pub fn kind(&self) -> BlockKind {
        BlockKind::from_id(self.block_id)
    }

    /// Parse a header from the start of `buf`. `offset` is only used for
    /// error reporting.
    pub fn parse(buf: &[u8], offset: usize) -> Result<Self, DecodeError> {
        if buf.len() < BLOCK_HEADER_SIZE {
            return Err(DecodeError::TruncatedInput {
                offset,
                needed: BLOCK_HEADER_SIZE,
                available: buf.len(),
            });
        }

        Ok(BlockHeader {
            block_id: u16::from_le_bytes([buf[0], buf[1]]),
            version: u16::from_le_bytes([buf[2], buf[3]]),
            block_size: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        })
    }

    /// Serialize header into `buf`
    pub fn serialize(&self, buf: &mut [u8]) -> Result<(), DecodeError> {
        if buf.len() < BLOCK_HEADER_SIZE {
            return Err(DecodeError::TruncatedInput {
                offset: 0,
                needed: BLOCK_HEADER_SIZE,
                available: buf.len(),
            });
        }

        buf[0..2].copy_from_slice(&self.block_id.to_le_bytes());
        buf[2..4].copy_from_slice(&self.version.to_le_bytes());
        buf[4..8].copy_from_slice(&self.block_size.to_le_bytes());
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut buf = [0u8; BLOCK_HEADER_SIZE];
        buf[0..2].copy_from_slice(&self.block_id.to_le_bytes());
        buf[2..4].copy_from_slice(&self.version.to_le_bytes());
        buf[4..8].copy_from_slice(&self.block_size.to_le_bytes());
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let header = BlockHeader {
            block_id: BLOCK_BLENDSHAPES,
            version: 1,
            block_size: 208,
        };

        let bytes = header.to_bytes();
        assert_eq!(bytes, [103, 0, 1, 0, 208, 0, 0, 0]);

        let parsed = BlockHeader::parse(&bytes, 0).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.kind(), BlockKind::Blendshapes);
    }

    #[test]
    fn test_header_too_short() {
        let err = BlockHeader::parse(&[0x99, 0x82, 1], 12).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedInput {
                offset: 12,
                needed: 8,
                available: 3
            }
        );
    }

    #[test]
    fn test_block_kind_ids() {
        assert_eq!(BlockKind::from_id(33433), BlockKind::TrackingState);
        assert_eq!(BlockKind::from_id(777), BlockKind::Unknown(777));
        assert_eq!(BlockKind::Markers.id(), 105);
    }
}
