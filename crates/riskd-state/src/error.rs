//! Risk state error types.

use riskd_core::Side;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("Invalid {side} threshold: {value} (must be positive)")]
    InvalidThreshold { side: Side, value: u64 },
}

pub type StateResult<T> = Result<T, StateError>;
