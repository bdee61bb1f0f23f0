//! Thread-safe handle over [`RiskState`].

use std::sync::Arc;

use parking_lot::Mutex;
use riskd_core::{InstrumentId, OrderId, Side};

use crate::ledger::InstrumentSnapshot;
use crate::store::{Decision, RejectReason, RiskState};
use crate::thresholds::Thresholds;

/// Result of one state operation, captured under the same lock as the
/// mutation so the snapshot reflects exactly that operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub decision: Decision,
    pub instrument_id: Option<InstrumentId>,
    pub snapshot: Option<InstrumentSnapshot>,
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        self.decision.is_accepted()
    }
}

/// Cloneable handle shared by every connection handler.
///
/// Operations from all connections are linearized by a single mutex.
#[derive(Debug, Clone)]
pub struct SharedRiskState {
    inner: Arc<Mutex<RiskState>>,
}

impl SharedRiskState {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RiskState::new(thresholds))),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.inner.lock().thresholds()
    }

    pub fn add_order(
        &self,
        instrument_id: InstrumentId,
        order_id: OrderId,
        quantity: u64,
        side: Side,
    ) -> Outcome {
        let mut state = self.inner.lock();
        let decision = state.add_order(instrument_id, order_id, quantity, side);
        Outcome {
            decision,
            instrument_id: Some(instrument_id),
            snapshot: state.snapshot(instrument_id),
        }
    }

    pub fn delete_order(&self, order_id: OrderId) -> Outcome {
        let mut state = self.inner.lock();
        match state.remove_order(order_id) {
            Some(instrument_id) => Outcome {
                decision: Decision::Accepted,
                instrument_id: Some(instrument_id),
                snapshot: state.snapshot(instrument_id),
            },
            None => Outcome {
                decision: Decision::Rejected(RejectReason::OrderNotFound),
                instrument_id: None,
                snapshot: None,
            },
        }
    }

    pub fn modify_order(&self, order_id: OrderId, new_qty: u64) -> Outcome {
        let mut state = self.inner.lock();
        let decision = state.modify_order(order_id, new_qty);
        let instrument_id = state.find_instrument_id_by_order(order_id);
        Outcome {
            decision,
            instrument_id,
            snapshot: instrument_id.and_then(|id| state.snapshot(id)),
        }
    }

    pub fn process_trade(&self, instrument_id: InstrumentId, quantity: i64) -> InstrumentSnapshot {
        self.inner.lock().process_trade(instrument_id, quantity)
    }

    pub fn find_instrument_id_by_order(&self, order_id: OrderId) -> Option<InstrumentId> {
        self.inner.lock().find_instrument_id_by_order(order_id)
    }

    pub fn snapshot(&self, instrument_id: InstrumentId) -> Option<InstrumentSnapshot> {
        self.inner.lock().snapshot(instrument_id)
    }

    pub fn snapshots(&self) -> Vec<InstrumentSnapshot> {
        self.inner.lock().snapshots()
    }

    pub fn open_order_count(&self) -> usize {
        self.inner.lock().open_order_count()
    }

    pub fn instrument_count(&self) -> usize {
        self.inner.lock().instrument_count()
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn shared() -> SharedRiskState {
        SharedRiskState::new(Thresholds::new(20, 15).unwrap())
    }

    #[test]
    fn test_outcome_carries_post_operation_snapshot() {
        let state = shared();
        let outcome = state.add_order(InstrumentId(1), OrderId(1), 10, Side::Buy);
        assert!(outcome.is_accepted());
        assert_eq!(outcome.instrument_id, Some(InstrumentId(1)));
        assert_eq!(outcome.snapshot.unwrap().buy_qty, 10);

        let snapshot = state.process_trade(InstrumentId(1), 5);
        assert_eq!(snapshot.worst_buy, 15);
    }

    #[test]
    fn test_delete_outcome() {
        let state = shared();
        state.add_order(InstrumentId(3), OrderId(1), 10, Side::Sell);

        let outcome = state.delete_order(OrderId(1));
        assert!(outcome.is_accepted());
        assert_eq!(outcome.instrument_id, Some(InstrumentId(3)));
        assert_eq!(outcome.snapshot.unwrap().sell_qty, 0);

        let outcome = state.delete_order(OrderId(1));
        assert!(!outcome.is_accepted());
        assert_eq!(outcome.instrument_id, None);
    }

    #[test]
    fn test_modify_unknown_has_no_instrument() {
        let state = shared();
        let outcome = state.modify_order(OrderId(5), 3);
        assert_eq!(outcome.decision, Decision::Rejected(RejectReason::OrderNotFound));
        assert_eq!(outcome.snapshot, None);
    }

    #[test]
    fn test_concurrent_orders_capped_exactly() {
        // Two connections race 10 orders of qty 1 each against max_buy = 15.
        let state = SharedRiskState::new(Thresholds::new(15, 15).unwrap());
        let handles: Vec<_> = (0..2u64)
            .map(|conn| {
                let state = state.clone();
                thread::spawn(move || {
                    (0..10u64)
                        .filter(|i| {
                            state
                                .add_order(InstrumentId(1), OrderId(conn * 100 + i), 1, Side::Buy)
                                .is_accepted()
                        })
                        .count()
                })
            })
            .collect();

        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(accepted, 15);
        assert_eq!(state.snapshot(InstrumentId(1)).unwrap().buy_qty, 15);
    }

    #[test]
    fn test_reset_through_handle() {
        let state = shared();
        let other = state.clone();
        state.add_order(InstrumentId(1), OrderId(1), 10, Side::Buy);
        other.reset();
        assert_eq!(state.instrument_count(), 0);
        assert_eq!(state.find_instrument_id_by_order(OrderId(1)), None);
    }
}
