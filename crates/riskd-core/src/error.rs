//! Error types for riskd-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid side byte: 0x{0:02x}")]
    InvalidSide(u8),

    #[error("Invalid order status: {0}")]
    InvalidStatus(u16),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
