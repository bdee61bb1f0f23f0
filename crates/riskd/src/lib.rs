//! riskd: pre-trade position risk server.
//!
//! Wires configuration, logging, the shared risk store, the order and trade
//! listeners and the optional metrics endpoint into one process.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
