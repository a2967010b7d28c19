//! Error types for rigstream

use thiserror::Error;

/// Failure to decode one wire message.
///
/// A decode error only ever concerns the message it was raised for; the
/// receiver drops that message and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Truncated input: needed {needed} bytes at offset {offset}, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("Unsupported version {version} for block {block_id}")]
    UnsupportedVersion { block_id: u16, version: u16 },

    #[error("Malformed message: {0}")]
    MalformedMessage(String),
}

/// Socket level failures. Timeouts are not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Bind failed on {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Transport closed")]
    Closed,

    #[error("Peer not discovered yet")]
    NotDiscovered,
}

/// Mapping table construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Channel {channel} has {actual} target vectors, table width is {expected}")]
    WidthMismatch {
        channel: String,
        expected: usize,
        actual: usize,
    },

    #[error("Channel {channel} targets slot {index}, table width is {width}")]
    TargetOutOfRange {
        channel: String,
        index: usize,
        width: usize,
    },

    #[error("Channel {0} mapped twice")]
    DuplicateChannel(String),
}

/// Core rigstream errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RigError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type RigResult<T> = Result<T, RigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err: RigError = DecodeError::TruncatedInput {
            offset: 8,
            needed: 4,
            available: 1,
        }
        .into();
        assert!(matches!(err, RigError::Decode(_)));
        assert_eq!(
            err.to_string(),
            "Truncated input: needed 4 bytes at offset 8, 1 available"
        );

        let err: RigError = TransportError::Closed.into();
        assert_eq!(err.to_string(), "Transport closed");
    }
}
