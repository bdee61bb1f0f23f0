//! TCP front end for riskd.
//!
//! [`RiskServer`] binds the order and trade listeners and spawns a
//! [`ConnectionHandler`] per accepted socket. All handlers share one
//! [`riskd_state::SharedRiskState`]. [`RiskClient`] speaks the same protocol
//! from the other side and backs the integration tests and the demo binary.

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod limiter;
pub mod metrics_http;
pub mod server;

pub use client::RiskClient;
pub use config::{MetricsConfig, ServerConfig, SessionPolicy};
pub use connection::{log_instrument_state, CloseReason, ConnectionHandler, ConnectionStats};
pub use error::{ServerError, ServerResult};
pub use limiter::{ConnectionGuard, ConnectionLimiter};
pub use metrics_http::{create_router, run_metrics_server};
pub use server::{BoundAddrs, RiskServer};
