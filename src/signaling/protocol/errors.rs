use std::io;

use thiserror::Error;

/// Protocol-level errors (body parsing/format issues, etc.).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtoError {
    #[error("unknown message type 0x{0:02x}")]
    UnknownType(u8),
    #[error("unknown room event tag 0x{0:02x}")]
    UnknownEvent(u8),
    #[error("unknown role {0}")]
    UnknownRole(u8),
    #[error("message body truncated")]
    Truncated,
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("frame body exceeds the configured maximum")]
    TooLarge,
    #[error("invalid format: {0}")]
    InvalidFormat(&'static str),
    #[error("string of {actual} bytes exceeds limit of {max}")]
    StringTooLong { max: usize, actual: usize },
}

/// Frame-level error wrapper: IO vs protocol.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),
}
