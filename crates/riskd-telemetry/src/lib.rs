//! Prometheus metrics and structured logging for riskd.
//!
//! - Prometheus counters for admission decisions, dropped frames and
//!   connection lifecycle
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::{gather_text, Metrics};
