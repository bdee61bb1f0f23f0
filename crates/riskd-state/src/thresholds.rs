//! Admission thresholds.

use crate::error::{StateError, StateResult};
use riskd_core::Side;
use serde::{Deserialize, Serialize};

/// Maximum hypothetical worst position per side.
///
/// Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    max_buy: u64,
    max_sell: u64,
}

impl Thresholds {
    pub fn new(max_buy: u64, max_sell: u64) -> StateResult<Self> {
        if max_buy == 0 {
            return Err(StateError::InvalidThreshold {
                side: Side::Buy,
                value: max_buy,
            });
        }
        if max_sell == 0 {
            return Err(StateError::InvalidThreshold {
                side: Side::Sell,
                value: max_sell,
            });
        }
        Ok(Self { max_buy, max_sell })
    }

    pub fn max_buy(&self) -> u64 {
        self.max_buy
    }

    pub fn max_sell(&self) -> u64 {
        self.max_sell
    }

    pub fn for_side(&self, side: Side) -> u64 {
        match side {
            Side::Buy => self.max_buy,
            Side::Sell => self.max_sell,
        }
    }
}
