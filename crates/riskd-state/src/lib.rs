//! Per-instrument risk ledger and admission control.
//!
//! The store tracks, for every instrument:
//! - net position from executed trades
//! - open buy and sell quantity from accepted orders
//! - the open order records themselves
//!
//! New and modified orders are admitted only if the hypothetical worst
//! position on the order's side stays within that side's threshold:
//!
//! ```text
//! worst_buy  = max(buy_qty,  net_position + buy_qty)
//! worst_sell = max(sell_qty, sell_qty - net_position)
//! ```
//!
//! [`RiskState`] is plain single-owner logic. [`SharedRiskState`] is the
//! handle given to connection handlers; every operation runs under one lock.

pub mod error;
pub mod ledger;
pub mod shared;
pub mod store;
pub mod thresholds;

pub use error::{StateError, StateResult};
pub use ledger::{worst_buy, worst_sell, InstrumentLedger, InstrumentSnapshot, OrderRecord};
pub use shared::{Outcome, SharedRiskState};
pub use store::{Decision, RejectReason, RiskState};
pub use thresholds::Thresholds;
