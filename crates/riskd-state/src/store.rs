//! Single-owner risk state store.
//!
//! All admission logic lives here. Nothing in this module locks; callers that
//! share the store across tasks go through [`crate::SharedRiskState`].

use std::collections::HashMap;

use riskd_core::{InstrumentId, OrderId, Side};
use tracing::{debug, warn};

use crate::ledger::{InstrumentLedger, InstrumentSnapshot, OrderRecord};
use crate::thresholds::Thresholds;

/// Why an order or modification was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Quantity of zero.
    ZeroQuantity,
    /// The order id is already open on some instrument.
    DuplicateOrderId,
    /// Delete or modify for an order id that is not open.
    OrderNotFound,
    /// The hypothetical worst position would exceed the side's threshold.
    ThresholdBreach { side: Side, worst: i128, limit: u64 },
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroQuantity => "zero_quantity",
            Self::DuplicateOrderId => "duplicate_order_id",
            Self::OrderNotFound => "order_not_found",
            Self::ThresholdBreach { .. } => "threshold_breach",
        }
    }
}

/// Admission outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Rejected(RejectReason),
}

impl Decision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Accepted => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }
}

/// Instrument ledgers plus an order id index.
///
/// Invariants:
/// - `buy_qty`/`sell_qty` equal the sum of open order quantities per side
/// - every open order id appears in exactly one ledger and in the index
#[derive(Debug)]
pub struct RiskState {
    thresholds: Thresholds,
    ledgers: HashMap<InstrumentId, InstrumentLedger>,
    order_index: HashMap<OrderId, InstrumentId>,
}

impl RiskState {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            ledgers: HashMap::new(),
            order_index: HashMap::new(),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Admit a new order if the resulting worst position on its side stays
    /// within the threshold.
    ///
    /// The instrument ledger is created even when the order is rejected.
    pub fn add_order(
        &mut self,
        instrument_id: InstrumentId,
        order_id: OrderId,
        quantity: u64,
        side: Side,
    ) -> Decision {
        let ledger = self.ledgers.entry(instrument_id).or_default();

        if quantity == 0 {
            return Decision::Rejected(RejectReason::ZeroQuantity);
        }
        if self.order_index.contains_key(&order_id) {
            return Decision::Rejected(RejectReason::DuplicateOrderId);
        }

        let simulated = i128::from(ledger.open_qty(side)) + i128::from(quantity);
        let worst = ledger.worst_with(side, simulated);
        let limit = self.thresholds.for_side(side);
        if worst > i128::from(limit) {
            debug!(
                %instrument_id,
                %order_id,
                %side,
                worst = %worst,
                limit,
                "New order breaches threshold"
            );
            return Decision::Rejected(RejectReason::ThresholdBreach { side, worst, limit });
        }

        // worst >= simulated, so the committed quantity is bounded by `limit`.
        ledger.set_open_qty(side, clamp_to_u64(simulated));
        ledger.open_orders.push(OrderRecord {
            order_id,
            quantity,
            side,
        });
        self.order_index.insert(order_id, instrument_id);
        Decision::Accepted
    }

    pub fn add_order_if_accepted(
        &mut self,
        instrument_id: InstrumentId,
        order_id: OrderId,
        quantity: u64,
        side: Side,
    ) -> bool {
        self.add_order(instrument_id, order_id, quantity, side)
            .is_accepted()
    }

    /// Remove an open order, returning the instrument it belonged to.
    pub fn remove_order(&mut self, order_id: OrderId) -> Option<InstrumentId> {
        let instrument_id = self.order_index.remove(&order_id)?;
        let ledger = self.ledgers.get_mut(&instrument_id)?;
        let idx = ledger.position_of(order_id)?;
        let record = ledger.open_orders.remove(idx);
        let remaining = ledger.open_qty(record.side).saturating_sub(record.quantity);
        ledger.set_open_qty(record.side, remaining);
        Some(instrument_id)
    }

    /// Delete an open order. Returns whether it was found.
    pub fn delete_order(&mut self, order_id: OrderId) -> bool {
        self.remove_order(order_id).is_some()
    }

    /// Change an open order's quantity if the new worst position on the
    /// order's side stays within the threshold.
    ///
    /// A rejected modification leaves the ledger untouched.
    pub fn modify_order(&mut self, order_id: OrderId, new_qty: u64) -> Decision {
        let Some(&instrument_id) = self.order_index.get(&order_id) else {
            return Decision::Rejected(RejectReason::OrderNotFound);
        };
        let Some(ledger) = self.ledgers.get_mut(&instrument_id) else {
            return Decision::Rejected(RejectReason::OrderNotFound);
        };
        let Some(idx) = ledger.position_of(order_id) else {
            return Decision::Rejected(RejectReason::OrderNotFound);
        };
        if new_qty == 0 {
            return Decision::Rejected(RejectReason::ZeroQuantity);
        }

        let record = ledger.open_orders[idx];
        let tentative = i128::from(ledger.open_qty(record.side)) - i128::from(record.quantity)
            + i128::from(new_qty);
        let worst = ledger.worst_with(record.side, tentative);
        let limit = self.thresholds.for_side(record.side);
        if worst > i128::from(limit) {
            debug!(
                %instrument_id,
                %order_id,
                side = %record.side,
                worst = %worst,
                limit,
                "Modify breaches threshold"
            );
            return Decision::Rejected(RejectReason::ThresholdBreach {
                side: record.side,
                worst,
                limit,
            });
        }

        ledger.set_open_qty(record.side, clamp_to_u64(tentative));
        ledger.open_orders[idx].quantity = new_qty;
        Decision::Accepted
    }

    pub fn modify_order_if_accepted(&mut self, order_id: OrderId, new_qty: u64) -> bool {
        self.modify_order(order_id, new_qty).is_accepted()
    }

    /// Apply an executed trade. Never rejected.
    ///
    /// Returns the instrument's snapshot after the update.
    pub fn process_trade(
        &mut self,
        instrument_id: InstrumentId,
        quantity: i64,
    ) -> InstrumentSnapshot {
        let ledger = self.ledgers.entry(instrument_id).or_default();
        match ledger.net_position.checked_add(quantity) {
            Some(net) => ledger.net_position = net,
            None => {
                warn!(%instrument_id, quantity, "Net position saturated");
                ledger.net_position = ledger.net_position.saturating_add(quantity);
            }
        }
        ledger.snapshot(instrument_id)
    }

    pub fn find_instrument_id_by_order(&self, order_id: OrderId) -> Option<InstrumentId> {
        self.order_index.get(&order_id).copied()
    }

    pub fn open_order(&self, order_id: OrderId) -> Option<OrderRecord> {
        let instrument_id = self.order_index.get(&order_id)?;
        let ledger = self.ledgers.get(instrument_id)?;
        ledger
            .open_orders
            .iter()
            .find(|o| o.order_id == order_id)
            .copied()
    }

    pub fn ledger(&self, instrument_id: InstrumentId) -> Option<&InstrumentLedger> {
        self.ledgers.get(&instrument_id)
    }

    pub fn hypothetical_worst_buy(&self, instrument_id: InstrumentId) -> Option<i128> {
        self.ledger(instrument_id)
            .map(InstrumentLedger::hypothetical_worst_buy)
    }

    pub fn hypothetical_worst_sell(&self, instrument_id: InstrumentId) -> Option<i128> {
        self.ledger(instrument_id)
            .map(InstrumentLedger::hypothetical_worst_sell)
    }

    pub fn snapshot(&self, instrument_id: InstrumentId) -> Option<InstrumentSnapshot> {
        self.ledger(instrument_id).map(|l| l.snapshot(instrument_id))
    }

    /// Snapshots of every known instrument, ordered by id.
    pub fn snapshots(&self) -> Vec<InstrumentSnapshot> {
        let mut snapshots: Vec<_> = self
            .ledgers
            .iter()
            .map(|(id, ledger)| ledger.snapshot(*id))
            .collect();
        snapshots.sort_by_key(|s| s.instrument_id);
        snapshots
    }

    pub fn instrument_count(&self) -> usize {
        self.ledgers.len()
    }

    pub fn open_order_count(&self) -> usize {
        self.order_index.len()
    }

    /// Drop every ledger and open order.
    pub fn reset(&mut self) {
        debug!(
            instruments = self.ledgers.len(),
            open_orders = self.order_index.len(),
            "Resetting risk state"
        );
        self.ledgers.clear();
        self.order_index.clear();
    }
}

fn clamp_to_u64(value: i128) -> u64 {
    u64::try_from(value.max(0)).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> RiskState {
        RiskState::new(Thresholds::new(20, 15).unwrap())
    }

    fn iid(id: u64) -> InstrumentId {
        InstrumentId(id)
    }

    fn oid(id: u64) -> OrderId {
        OrderId(id)
    }

    #[test]
    fn test_scenario_a_accept_then_reject() {
        let mut state = state();
        assert!(state.add_order_if_accepted(iid(1), oid(1), 10, Side::Buy));
        assert_eq!(state.hypothetical_worst_buy(iid(1)), Some(10));

        let decision = state.add_order(iid(2), oid(2), 30, Side::Buy);
        assert_eq!(
            decision,
            Decision::Rejected(RejectReason::ThresholdBreach {
                side: Side::Buy,
                worst: 30,
                limit: 20
            })
        );
    }

    #[test]
    fn test_scenario_b_trade_moves_worst_buy() {
        let mut state = state();
        assert!(state.add_order_if_accepted(iid(1), oid(1), 10, Side::Buy));
        state.process_trade(iid(1), 5);

        let snapshot = state.snapshot(iid(1)).unwrap();
        assert_eq!(snapshot.net_position, 5);
        assert_eq!(snapshot.buy_qty, 10);
        assert_eq!(snapshot.worst_buy, 15);
    }

    #[test]
    fn test_scenario_c_sell_then_buy() {
        let mut state = state();
        assert!(state.add_order_if_accepted(iid(1), oid(1), 8, Side::Sell));
        assert_eq!(state.hypothetical_worst_sell(iid(1)), Some(8));
        assert!(!state.add_order_if_accepted(iid(2), oid(2), 25, Side::Buy));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let mut state = state();
        assert!(state.add_order_if_accepted(iid(1), oid(1), 20, Side::Buy));
        assert!(!state.add_order_if_accepted(iid(1), oid(2), 1, Side::Buy));
        assert!(state.add_order_if_accepted(iid(1), oid(3), 15, Side::Sell));
    }

    #[test]
    fn test_rejected_order_still_creates_ledger() {
        let mut state = state();
        assert!(!state.add_order_if_accepted(iid(9), oid(1), 100, Side::Buy));

        let snapshot = state.snapshot(iid(9)).unwrap();
        assert_eq!(snapshot.buy_qty, 0);
        assert_eq!(snapshot.open_orders, 0);
        assert_eq!(state.find_instrument_id_by_order(oid(1)), None);
    }

    #[test]
    fn test_short_position_limits_sells() {
        let mut state = state();
        state.process_trade(iid(1), -10);
        // worst_sell = max(6, 6 + 10) = 16 > 15
        assert!(!state.add_order_if_accepted(iid(1), oid(1), 6, Side::Sell));
        assert!(state.add_order_if_accepted(iid(1), oid(2), 5, Side::Sell));
        // Short position does not count against buys.
        assert!(state.add_order_if_accepted(iid(1), oid(3), 20, Side::Buy));
    }

    #[test]
    fn test_duplicate_order_id_rejected_across_instruments() {
        let mut state = state();
        assert!(state.add_order_if_accepted(iid(1), oid(7), 5, Side::Buy));
        assert_eq!(
            state.add_order(iid(2), oid(7), 5, Side::Buy),
            Decision::Rejected(RejectReason::DuplicateOrderId)
        );
        assert_eq!(state.find_instrument_id_by_order(oid(7)), Some(iid(1)));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut state = state();
        assert_eq!(
            state.add_order(iid(1), oid(1), 0, Side::Buy),
            Decision::Rejected(RejectReason::ZeroQuantity)
        );
        assert!(state.add_order_if_accepted(iid(1), oid(2), 5, Side::Buy));
        assert_eq!(
            state.modify_order(oid(2), 0),
            Decision::Rejected(RejectReason::ZeroQuantity)
        );
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut state = state();
        assert!(state.add_order_if_accepted(iid(1), oid(1), 10, Side::Buy));
        assert!(state.add_order_if_accepted(iid(1), oid(2), 4, Side::Sell));

        assert!(state.delete_order(oid(1)));
        let after_first = state.snapshot(iid(1)).unwrap();
        assert_eq!(after_first.buy_qty, 0);
        assert_eq!(after_first.sell_qty, 4);

        assert!(!state.delete_order(oid(1)));
        assert_eq!(state.snapshot(iid(1)).unwrap(), after_first);
    }

    #[test]
    fn test_delete_frees_capacity() {
        let mut state = state();
        assert!(state.add_order_if_accepted(iid(1), oid(1), 20, Side::Buy));
        assert!(!state.add_order_if_accepted(iid(1), oid(2), 5, Side::Buy));
        assert_eq!(state.remove_order(oid(1)), Some(iid(1)));
        assert!(state.add_order_if_accepted(iid(1), oid(2), 5, Side::Buy));
    }

    #[test]
    fn test_modify_rollback_leaves_state_unchanged() {
        let mut state = state();
        assert!(state.add_order_if_accepted(iid(1), oid(1), 10, Side::Buy));
        assert!(state.add_order_if_accepted(iid(1), oid(2), 5, Side::Buy));
        let before = state.snapshot(iid(1)).unwrap();

        assert!(!state.modify_order_if_accepted(oid(1), 16));

        assert_eq!(state.snapshot(iid(1)).unwrap(), before);
        assert_eq!(state.open_order(oid(1)).unwrap().quantity, 10);
    }

    #[test]
    fn test_modify_accepted_updates_record_and_total() {
        let mut state = state();
        assert!(state.add_order_if_accepted(iid(1), oid(1), 10, Side::Buy));
        assert!(state.modify_order_if_accepted(oid(1), 18));

        assert_eq!(state.open_order(oid(1)).unwrap().quantity, 18);
        assert_eq!(state.snapshot(iid(1)).unwrap().buy_qty, 18);

        assert!(state.modify_order_if_accepted(oid(1), 3));
        assert_eq!(state.snapshot(iid(1)).unwrap().buy_qty, 3);
    }

    #[test]
    fn test_modify_uses_committed_net_position() {
        let mut state = state();
        assert!(state.add_order_if_accepted(iid(1), oid(1), 10, Side::Buy));
        state.process_trade(iid(1), 8);
        // worst_buy = max(12, 8 + 12) = 20
        assert!(state.modify_order_if_accepted(oid(1), 12));
        // worst_buy = max(13, 8 + 13) = 21
        assert!(!state.modify_order_if_accepted(oid(1), 13));
    }

    #[test]
    fn test_modify_unknown_order() {
        let mut state = state();
        assert_eq!(
            state.modify_order(oid(42), 1),
            Decision::Rejected(RejectReason::OrderNotFound)
        );
        assert_eq!(state.instrument_count(), 0);
    }

    #[test]
    fn test_find_instrument_by_order() {
        let mut state = state();
        assert!(state.add_order_if_accepted(iid(1), oid(1), 1, Side::Buy));
        assert!(state.add_order_if_accepted(iid(2), oid(2), 1, Side::Sell));

        assert_eq!(state.find_instrument_id_by_order(oid(1)), Some(iid(1)));
        assert_eq!(state.find_instrument_id_by_order(oid(2)), Some(iid(2)));
        assert_eq!(state.find_instrument_id_by_order(oid(3)), None);
    }

    #[test]
    fn test_trade_saturates() {
        let mut state = state();
        state.process_trade(iid(1), i64::MAX);
        state.process_trade(iid(1), 1);
        assert_eq!(state.snapshot(iid(1)).unwrap().net_position, i64::MAX);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = state();
        assert!(state.add_order_if_accepted(iid(1), oid(1), 10, Side::Buy));
        state.process_trade(iid(2), 3);

        state.reset();

        assert_eq!(state.instrument_count(), 0);
        assert_eq!(state.open_order_count(), 0);
        assert!(state.snapshots().is_empty());
        assert!(state.add_order_if_accepted(iid(1), oid(1), 20, Side::Buy));
    }
}
