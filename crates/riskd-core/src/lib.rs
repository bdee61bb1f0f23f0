//! Core domain types for the riskd pre-trade risk server.
//!
//! This crate provides the identifiers and enums shared by every layer:
//! - `InstrumentId`, `OrderId`, `TradeId`: wire-level identifiers
//! - `Side`: buy/sell side of an order
//! - `OrderStatus`: outcome reported back on the order channel
//! - `Channel`: which listening endpoint a connection arrived on

pub mod error;
pub mod ids;
pub mod order;

pub use error::{CoreError, Result};
pub use ids::{InstrumentId, OrderId, TradeId};
pub use order::{Channel, OrderStatus, Side};
