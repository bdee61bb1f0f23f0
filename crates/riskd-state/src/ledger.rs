//! Per-instrument ledger and the hypothetical worst position formulas.

use riskd_core::{InstrumentId, OrderId, Side};
use serde::Serialize;

/// Hypothetical worst buy position: every open buy fills right now.
///
/// Computed in `i128` so no combination of inputs can overflow.
pub fn worst_buy(net_position: i64, buy_qty: i128) -> i128 {
    buy_qty.max(i128::from(net_position) + buy_qty)
}

/// Hypothetical worst sell position: every open sell fills right now.
pub fn worst_sell(net_position: i64, sell_qty: i128) -> i128 {
    sell_qty.max(sell_qty - i128::from(net_position))
}

/// An accepted, not yet deleted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub quantity: u64,
    pub side: Side,
}

/// Aggregate state for one instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentLedger {
    pub(crate) net_position: i64,
    pub(crate) buy_qty: u64,
    pub(crate) sell_qty: u64,
    pub(crate) open_orders: Vec<OrderRecord>,
}

impl InstrumentLedger {
    pub fn net_position(&self) -> i64 {
        self.net_position
    }

    pub fn buy_qty(&self) -> u64 {
        self.buy_qty
    }

    pub fn sell_qty(&self) -> u64 {
        self.sell_qty
    }

    pub fn open_orders(&self) -> &[OrderRecord] {
        &self.open_orders
    }

    /// Committed open quantity on one side.
    pub fn open_qty(&self, side: Side) -> u64 {
        match side {
            Side::Buy => self.buy_qty,
            Side::Sell => self.sell_qty,
        }
    }

    pub(crate) fn set_open_qty(&mut self, side: Side, qty: u64) {
        match side {
            Side::Buy => self.buy_qty = qty,
            Side::Sell => self.sell_qty = qty,
        }
    }

    pub fn hypothetical_worst_buy(&self) -> i128 {
        worst_buy(self.net_position, i128::from(self.buy_qty))
    }

    pub fn hypothetical_worst_sell(&self) -> i128 {
        worst_sell(self.net_position, i128::from(self.sell_qty))
    }

    /// Worst position on `side` if that side's open quantity were `open_qty`.
    pub fn worst_with(&self, side: Side, open_qty: i128) -> i128 {
        match side {
            Side::Buy => worst_buy(self.net_position, open_qty),
            Side::Sell => worst_sell(self.net_position, open_qty),
        }
    }

    pub(crate) fn position_of(&self, order_id: OrderId) -> Option<usize> {
        self.open_orders.iter().position(|o| o.order_id == order_id)
    }

    pub fn snapshot(&self, instrument_id: InstrumentId) -> InstrumentSnapshot {
        InstrumentSnapshot {
            instrument_id,
            net_position: self.net_position,
            buy_qty: self.buy_qty,
            sell_qty: self.sell_qty,
            worst_buy: self.hypothetical_worst_buy(),
            worst_sell: self.hypothetical_worst_sell(),
            open_orders: self.open_orders.len(),
        }
    }
}

/// Point-in-time view of one instrument, used for the state dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstrumentSnapshot {
    pub instrument_id: InstrumentId,
    pub net_position: i64,
    pub buy_qty: u64,
    pub sell_qty: u64,
    pub worst_buy: i128,
    pub worst_sell: i128,
    pub open_orders: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worst_buy_long_position() {
        // Long 5 with 10 open buys: a full fill leaves us long 15.
        assert_eq!(worst_buy(5, 10), 15);
    }

    #[test]
    fn test_worst_buy_short_position() {
        // Short 5: the open quantity itself bounds the worst case.
        assert_eq!(worst_buy(-5, 10), 10);
    }

    #[test]
    fn test_worst_sell() {
        assert_eq!(worst_sell(0, 8), 8);
        assert_eq!(worst_sell(-4, 8), 12);
        assert_eq!(worst_sell(4, 8), 8);
    }

    #[test]
    fn test_worst_no_overflow_at_extremes() {
        assert_eq!(
            worst_buy(i64::MAX, i128::from(u64::MAX)),
            i128::from(i64::MAX) + i128::from(u64::MAX)
        );
        assert_eq!(
            worst_sell(i64::MIN, i128::from(u64::MAX)),
            i128::from(u64::MAX) - i128::from(i64::MIN)
        );
    }

    #[test]
    fn test_snapshot_fields() {
        let ledger = InstrumentLedger {
            net_position: 5,
            buy_qty: 10,
            sell_qty: 0,
            open_orders: vec![OrderRecord {
                order_id: OrderId(1),
                quantity: 10,
                side: Side::Buy,
            }],
        };
        let snapshot = ledger.snapshot(InstrumentId(1));
        assert_eq!(snapshot.worst_buy, 15);
        assert_eq!(snapshot.worst_sell, 0);
        assert_eq!(snapshot.open_orders, 1);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let ledger = InstrumentLedger {
            net_position: -3,
            buy_qty: 4,
            sell_qty: 0,
            open_orders: Vec::new(),
        };
        let json = serde_json::to_value(ledger.snapshot(InstrumentId(2))).unwrap();
        assert_eq!(json["instrument_id"], 2);
        assert_eq!(json["net_position"], -3);
        assert_eq!(json["worst_buy"], 4);
        assert_eq!(json["worst_sell"], 3);
    }
}
