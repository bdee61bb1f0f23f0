//! Server error types.

use std::time::Duration;

use riskd_core::Channel;
use riskd_wire::WireError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {channel} listener on {addr}: {source}")]
    Bind {
        channel: Channel,
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Metrics server failed: {0}")]
    Metrics(String),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Timed out after {0:?} waiting for a response")]
    Timeout(Duration),

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;
