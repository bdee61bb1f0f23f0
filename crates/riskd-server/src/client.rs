//! Client for the order and trade channels.

use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use riskd_core::{Channel, InstrumentId, OrderId, Side, TradeId};
use riskd_wire::{
    ClientCodec, DeleteOrder, Frame, Message, ModifyOrderQty, NewOrder, OrderResponse, Trade,
};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;
use tracing::debug;

use crate::error::{ServerError, ServerResult};

/// One connection to a riskd listener.
///
/// Stamps every frame with a per-connection sequence number and the current
/// time in nanoseconds since the Unix epoch.
pub struct RiskClient {
    channel: Channel,
    framed: Framed<TcpStream, ClientCodec>,
    next_sequence: u32,
}

impl RiskClient {
    pub async fn connect(addr: impl ToSocketAddrs, channel: Channel) -> ServerResult<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self {
            channel,
            framed: Framed::new(stream, ClientCodec),
            next_sequence: 1,
        })
    }

    pub async fn send_new_order(
        &mut self,
        instrument_id: InstrumentId,
        order_id: OrderId,
        quantity: u64,
        price: u64,
        side: Side,
    ) -> ServerResult<()> {
        self.send(NewOrder {
            instrument_id,
            order_id,
            quantity,
            price,
            side,
        })
        .await
    }

    pub async fn send_delete_order(&mut self, order_id: OrderId) -> ServerResult<()> {
        self.send(DeleteOrder { order_id }).await
    }

    pub async fn send_modify_order(&mut self, order_id: OrderId, new_qty: u64) -> ServerResult<()> {
        self.send(ModifyOrderQty { order_id, new_qty }).await
    }

    pub async fn send_trade(
        &mut self,
        instrument_id: InstrumentId,
        trade_id: TradeId,
        quantity: i64,
        price: u64,
    ) -> ServerResult<()> {
        self.send(Trade {
            instrument_id,
            trade_id,
            quantity,
            price,
        })
        .await
    }

    /// Send any message wrapped in a freshly stamped frame.
    pub async fn send(&mut self, message: impl Into<Message>) -> ServerResult<()> {
        let frame = Frame::new(message, self.next_sequence, timestamp_nanos());
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.send_frame(frame).await
    }

    /// Send a frame as-is, header included.
    pub async fn send_frame(&mut self, frame: Frame) -> ServerResult<()> {
        debug!(
            channel = %self.channel,
            sequence_number = frame.header.sequence_number,
            message_type = frame.message.message_type().as_str(),
            "Sending frame"
        );
        self.framed.send(frame).await?;
        Ok(())
    }

    /// Write raw bytes, bypassing framing.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> ServerResult<()> {
        use tokio::io::AsyncWriteExt;
        self.framed.get_mut().write_all(bytes).await?;
        Ok(())
    }

    /// Wait up to `timeout` for the next order response.
    pub async fn recv_response(&mut self, timeout: Duration) -> ServerResult<OrderResponse> {
        match tokio::time::timeout(timeout, self.framed.next()).await {
            Ok(Some(Ok(response))) => Ok(response),
            Ok(Some(Err(e))) => Err(e.into()),
            Ok(None) => Err(ServerError::ConnectionClosed),
            Err(_) => Err(ServerError::Timeout(timeout)),
        }
    }
}

fn timestamp_nanos() -> u64 {
    Utc::now()
        .timestamp_nanos_opt()
        .and_then(|ns| u64::try_from(ns).ok())
        .unwrap_or(0)
}
