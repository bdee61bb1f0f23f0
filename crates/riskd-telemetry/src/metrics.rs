//! Prometheus metrics for riskd.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a startup bug; it can only happen during
//! static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge_vec, Encoder, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec,
    TextEncoder,
};
use riskd_core::Channel;

use crate::error::TelemetryResult;

/// Order admission decisions.
/// Labels: kind (new_order/delete_order/modify_order_qty), outcome (accepted/rejected)
pub static ORDERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "riskd_orders_total",
        "Order requests by kind and outcome",
        &["kind", "outcome"]
    )
    .unwrap()
});

/// Rejections by reason.
pub static REJECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "riskd_rejections_total",
        "Rejected order requests by reason",
        &["reason"]
    )
    .unwrap()
});

/// Frames dropped without a response.
pub static FRAMES_DROPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "riskd_frames_dropped_total",
        "Frames dropped by decode error reason",
        &["reason", "channel"]
    )
    .unwrap()
});

/// Trades applied.
pub static TRADES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("riskd_trades_total", "Trades applied to net position").unwrap()
});

/// Currently open connections per channel.
pub static ACTIVE_CONNECTIONS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "riskd_active_connections",
        "Open client connections",
        &["channel"]
    )
    .unwrap()
});

/// Accepted connections per channel.
pub static CONNECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "riskd_connections_total",
        "Accepted client connections",
        &["channel"]
    )
    .unwrap()
});

/// Connections refused because the limit was reached.
pub static CONNECTIONS_REFUSED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "riskd_connections_refused_total",
        "Connections refused at the connection limit",
        &["channel"]
    )
    .unwrap()
});

/// Full state resets.
pub static STATE_RESETS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("riskd_state_resets_total", "Full risk state resets").unwrap()
});

/// Time spent deciding one message, lock wait included.
pub static DECISION_LATENCY_US: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "riskd_decision_latency_us",
        "Message handling latency in microseconds",
        &["kind"],
        vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 250.0, 500.0, 1000.0]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    pub fn order_decided(kind: &str, accepted: bool) {
        let outcome = if accepted { "accepted" } else { "rejected" };
        ORDERS_TOTAL.with_label_values(&[kind, outcome]).inc();
    }

    pub fn order_rejected(reason: &str) {
        REJECTIONS_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn frame_dropped(reason: &str, channel: Channel) {
        FRAMES_DROPPED_TOTAL
            .with_label_values(&[reason, channel.as_str()])
            .inc();
    }

    pub fn trade_applied() {
        TRADES_TOTAL.inc();
    }

    /// Record an accepted connection.
    pub fn connection_opened(channel: Channel) {
        CONNECTIONS_TOTAL
            .with_label_values(&[channel.as_str()])
            .inc();
        ACTIVE_CONNECTIONS
            .with_label_values(&[channel.as_str()])
            .inc();
    }

    pub fn connection_closed(channel: Channel) {
        ACTIVE_CONNECTIONS
            .with_label_values(&[channel.as_str()])
            .dec();
    }

    pub fn connection_refused(channel: Channel) {
        CONNECTIONS_REFUSED_TOTAL
            .with_label_values(&[channel.as_str()])
            .inc();
    }

    pub fn state_reset() {
        STATE_RESETS_TOTAL.inc();
    }

    pub fn decision_latency(kind: &str, latency_us: f64) {
        DECISION_LATENCY_US
            .with_label_values(&[kind])
            .observe(latency_us);
    }
}

/// Encode every registered metric in the Prometheus text format.
pub fn gather_text() -> TelemetryResult<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
