//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("State error: {0}")]
    State(#[from] riskd_state::StateError),

    #[error("Server error: {0}")]
    Server(#[from] riskd_server::ServerError),
}

pub type AppResult<T> = Result<T, AppError>;
