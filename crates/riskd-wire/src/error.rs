//! Wire codec error types.

use riskd_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("Truncated message: need {needed} bytes, have {available}")]
    TruncatedMessage { needed: usize, available: usize },

    #[error("Unknown message type: {0}")]
    UnknownMessageType(u16),

    #[error("Payload size mismatch for type {message_type}: declared {declared}, expected {expected}")]
    PayloadSizeMismatch {
        message_type: u16,
        declared: usize,
        expected: usize,
    },

    #[error("Frame too large: payload {declared} bytes exceeds max {max}")]
    FrameTooLarge { declared: usize, max: usize },

    #[error("Invalid side byte: 0x{0:02x}")]
    InvalidSide(u8),

    #[error("Invalid order status: {0}")]
    InvalidStatus(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WireError {
    /// Short label used for metrics and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::TruncatedMessage { .. } => "truncated",
            Self::UnknownMessageType(_) => "unknown_type",
            Self::PayloadSizeMismatch { .. } => "size_mismatch",
            Self::FrameTooLarge { .. } => "too_large",
            Self::InvalidSide(_) => "invalid_side",
            Self::InvalidStatus(_) => "invalid_status",
            Self::Io(_) => "io",
        }
    }
}

impl From<CoreError> for WireError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidSide(byte) => Self::InvalidSide(byte),
            CoreError::InvalidStatus(value) => Self::InvalidStatus(value),
        }
    }
}

pub type WireResult<T> = Result<T, WireError>;
