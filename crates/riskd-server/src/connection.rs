//! Per-connection handler.
//!
//! Each accepted socket is tagged with its [`Channel`] and driven by one
//! task. Frames are handled strictly in arrival order; a frame that fails to
//! decode is logged and dropped, and the handler moves on to the next
//! aligned frame.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use riskd_core::Channel;
use riskd_state::{InstrumentSnapshot, Outcome, SharedRiskState};
use riskd_telemetry::Metrics;
use riskd_wire::{
    Decoded, Frame, FrameCodec, Header, Message, OrderResponse, WireError,
    DEFAULT_MAX_PAYLOAD_SIZE,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Counters for one connection, logged when it closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Frames decoded and dispatched.
    pub frames_processed: u64,
    /// Frames consumed but not acted on.
    pub frames_dropped: u64,
    pub responses_sent: u64,
}

/// Why the read loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    PeerClosed,
    IdleTimeout,
    Shutdown,
    ReadError,
    WriteError,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PeerClosed => "peer_closed",
            Self::IdleTimeout => "idle_timeout",
            Self::Shutdown => "shutdown",
            Self::ReadError => "read_error",
            Self::WriteError => "write_error",
        }
    }
}

enum Inbound {
    Decoded(Decoded),
    Failed(WireError),
    Closed,
    IdleTimeout,
}

/// Drives one client connection until it closes.
pub struct ConnectionHandler {
    channel: Channel,
    peer: SocketAddr,
    store: SharedRiskState,
    read_timeout: Option<Duration>,
    max_payload_size: usize,
    stats: ConnectionStats,
}

impl ConnectionHandler {
    pub fn new(
        channel: Channel,
        peer: SocketAddr,
        store: SharedRiskState,
        read_timeout: Option<Duration>,
    ) -> Self {
        Self {
            channel,
            peer,
            store,
            read_timeout,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            stats: ConnectionStats::default(),
        }
    }

    /// Largest payload accepted before the connection is closed.
    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats
    }

    /// Read and dispatch frames until the peer disconnects, the idle timeout
    /// fires, an unrecoverable error occurs, or `shutdown` is cancelled.
    pub async fn run<S>(mut self, io: S, shutdown: CancellationToken) -> ConnectionStats
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut framed = Framed::new(io, FrameCodec::with_max_payload_size(self.max_payload_size));
        Metrics::connection_opened(self.channel);
        info!(channel = %self.channel, peer = %self.peer, "Client connected");

        let reason = loop {
            let inbound = tokio::select! {
                biased;
                () = shutdown.cancelled() => break CloseReason::Shutdown,
                inbound = next_inbound(&mut framed, self.read_timeout) => inbound,
            };

            match inbound {
                Inbound::Decoded(Decoded::Frame(frame)) => {
                    let Some(response) = self.dispatch(frame) else {
                        continue;
                    };
                    if let Err(e) = framed.send(response).await {
                        warn!(
                            channel = %self.channel,
                            peer = %self.peer,
                            error = %e,
                            "Failed to send response"
                        );
                        break CloseReason::WriteError;
                    }
                    self.stats.responses_sent += 1;
                }
                Inbound::Decoded(Decoded::Rejected { header, error }) => {
                    self.drop_frame(&header, &error);
                }
                Inbound::Failed(error) => {
                    warn!(
                        channel = %self.channel,
                        peer = %self.peer,
                        error = %error,
                        "Unrecoverable read error, closing connection"
                    );
                    Metrics::frame_dropped(error.reason(), self.channel);
                    break CloseReason::ReadError;
                }
                Inbound::Closed => break CloseReason::PeerClosed,
                Inbound::IdleTimeout => break CloseReason::IdleTimeout,
            }
        };

        Metrics::connection_closed(self.channel);
        info!(
            channel = %self.channel,
            peer = %self.peer,
            reason = reason.as_str(),
            frames_processed = self.stats.frames_processed,
            frames_dropped = self.stats.frames_dropped,
            responses_sent = self.stats.responses_sent,
            "Client disconnected"
        );
        self.stats
    }

    /// Apply one decoded frame to the store. Returns the response to write
    /// back, if the channel answers this message.
    pub fn dispatch(&mut self, frame: Frame) -> Option<OrderResponse> {
        let kind = frame.message.message_type().as_str();
        let started = Instant::now();
        let response = match (self.channel, frame.message) {
            (Channel::Order, Message::NewOrder(order)) => {
                let outcome = self.store.add_order(
                    order.instrument_id,
                    order.order_id,
                    order.quantity,
                    order.side,
                );
                debug!(
                    instrument_id = %order.instrument_id,
                    order_id = %order.order_id,
                    quantity = order.quantity,
                    price = order.price,
                    side = %order.side,
                    accepted = outcome.is_accepted(),
                    "Processed new order"
                );
                self.record(kind, &outcome);
                Some(OrderResponse::new(order.order_id, outcome.is_accepted()))
            }
            (Channel::Order, Message::DeleteOrder(delete)) => {
                let outcome = self.store.delete_order(delete.order_id);
                debug!(
                    order_id = %delete.order_id,
                    found = outcome.is_accepted(),
                    "Processed delete order"
                );
                self.record(kind, &outcome);
                Some(OrderResponse::new(delete.order_id, outcome.is_accepted()))
            }
            (Channel::Order, Message::ModifyOrderQty(modify)) => {
                let outcome = self.store.modify_order(modify.order_id, modify.new_qty);
                debug!(
                    order_id = %modify.order_id,
                    new_qty = modify.new_qty,
                    accepted = outcome.is_accepted(),
                    "Processed modify order"
                );
                self.record(kind, &outcome);
                Some(OrderResponse::new(modify.order_id, outcome.is_accepted()))
            }
            (Channel::Trade, Message::Trade(trade)) => {
                let snapshot = self.store.process_trade(trade.instrument_id, trade.quantity);
                debug!(
                    instrument_id = %trade.instrument_id,
                    trade_id = %trade.trade_id,
                    quantity = trade.quantity,
                    price = trade.price,
                    "Processed trade"
                );
                Metrics::trade_applied();
                log_instrument_state(&snapshot);
                None
            }
            (channel, message) => {
                warn!(
                    channel = %channel,
                    peer = %self.peer,
                    sequence_number = frame.header.sequence_number,
                    message_type = message.message_type().as_str(),
                    "Unexpected message type for channel, dropping"
                );
                Metrics::frame_dropped("unexpected_type", channel);
                self.stats.frames_dropped += 1;
                return None;
            }
        };
        Metrics::decision_latency(kind, started.elapsed().as_secs_f64() * 1_000_000.0);
        self.stats.frames_processed += 1;
        response
    }

    fn record(&self, kind: &str, outcome: &Outcome) {
        Metrics::order_decided(kind, outcome.is_accepted());
        if let Some(reason) = outcome.decision.reject_reason() {
            Metrics::order_rejected(reason.as_str());
            return;
        }
        if let Some(snapshot) = &outcome.snapshot {
            log_instrument_state(snapshot);
        }
    }

    fn drop_frame(&mut self, header: &Header, error: &WireError) {
        warn!(
            channel = %self.channel,
            peer = %self.peer,
            sequence_number = header.sequence_number,
            payload_size = header.payload_size,
            error = %error,
            "Dropping malformed frame"
        );
        Metrics::frame_dropped(error.reason(), self.channel);
        self.stats.frames_dropped += 1;
    }
}

async fn next_inbound<S>(
    framed: &mut Framed<S, FrameCodec>,
    read_timeout: Option<Duration>,
) -> Inbound
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let next = match read_timeout {
        Some(limit) => match tokio::time::timeout(limit, framed.next()).await {
            Ok(next) => next,
            Err(_) => return Inbound::IdleTimeout,
        },
        None => framed.next().await,
    };
    match next {
        Some(Ok(decoded)) => Inbound::Decoded(decoded),
        Some(Err(error)) => Inbound::Failed(error),
        None => Inbound::Closed,
    }
}

/// Per-instrument state dump emitted after every accepted mutation.
pub fn log_instrument_state(snapshot: &InstrumentSnapshot) {
    info!(
        target: "riskd::state",
        instrument_id = %snapshot.instrument_id,
        net_position = snapshot.net_position,
        buy_qty = snapshot.buy_qty,
        sell_qty = snapshot.sell_qty,
        worst_buy = %snapshot.worst_buy,
        worst_sell = %snapshot.worst_sell,
        open_orders = snapshot.open_orders,
        "Instrument state"
    );
}
