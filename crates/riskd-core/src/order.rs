//! Order side, response status and channel tags.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side: buy or sell.
///
/// Encoded on the wire as a single ASCII byte, `'B'` or `'S'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Wire byte for a buy order.
    pub const BUY_BYTE: u8 = b'B';
    /// Wire byte for a sell order.
    pub const SELL_BYTE: u8 = b'S';

    /// Returns the wire byte for this side.
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Buy => Self::BUY_BYTE,
            Self::Sell => Self::SELL_BYTE,
        }
    }

    /// Parse a wire byte.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            Self::BUY_BYTE => Ok(Self::Buy),
            Self::SELL_BYTE => Ok(Self::Sell),
            other => Err(CoreError::InvalidSide(other)),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Outcome carried by an order response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Accepted,
    Rejected,
}

impl OrderStatus {
    /// Map a boolean decision to a status.
    pub fn from_accepted(accepted: bool) -> Self {
        if accepted {
            Self::Accepted
        } else {
            Self::Rejected
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Wire value (0 = accepted, 1 = rejected).
    pub fn as_u16(&self) -> u16 {
        match self {
            Self::Accepted => 0,
            Self::Rejected => 1,
        }
    }

    pub fn from_u16(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Self::Accepted),
            1 => Ok(Self::Rejected),
            other => Err(CoreError::InvalidStatus(other)),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Listening endpoint a connection was accepted on.
///
/// Fixed for the lifetime of the connection; selects which message types
/// are legal and whether responses are ever sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// New/delete/modify requests, answered with an order response.
    Order,
    /// One-way trade confirmations.
    Trade,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Trade => "trade",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_from_byte() {
        assert_eq!(Side::from_byte(b'B'), Ok(Side::Buy));
        assert_eq!(Side::from_byte(b'S'), Ok(Side::Sell));
        assert_eq!(Side::from_byte(b'b'), Err(CoreError::InvalidSide(b'b')));
    }

    #[test]
    fn test_status_wire_values() {
        assert_eq!(OrderStatus::Accepted.as_u16(), 0);
        assert_eq!(OrderStatus::Rejected.as_u16(), 1);
        assert_eq!(OrderStatus::from_u16(2), Err(CoreError::InvalidStatus(2)));
        assert!(OrderStatus::from_accepted(true).is_accepted());
    }
}
