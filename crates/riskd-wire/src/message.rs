//! Fixed-layout message bodies.
//!
//! Each body starts with its `u16` message type tag. Layouts are packed:
//! no padding, fields in declared order, little-endian integers.

use crate::error::{WireError, WireResult};
use bytes::{Buf, BufMut};
use riskd_core::{InstrumentId, OrderId, OrderStatus, Side, TradeId};
use std::fmt;

/// Size of the leading message type tag.
pub const MESSAGE_TYPE_SIZE: usize = 2;

/// Message type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    NewOrder = 1,
    DeleteOrder = 2,
    ModifyOrderQty = 3,
    Trade = 4,
    OrderResponse = 5,
}

impl MessageType {
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    pub fn from_u16(value: u16) -> WireResult<Self> {
        match value {
            1 => Ok(Self::NewOrder),
            2 => Ok(Self::DeleteOrder),
            3 => Ok(Self::ModifyOrderQty),
            4 => Ok(Self::Trade),
            5 => Ok(Self::OrderResponse),
            other => Err(WireError::UnknownMessageType(other)),
        }
    }

    /// Body size implied by the type, tag included.
    pub fn body_size(&self) -> usize {
        match self {
            Self::NewOrder => NewOrder::SIZE,
            Self::DeleteOrder => DeleteOrder::SIZE,
            Self::ModifyOrderQty => ModifyOrderQty::SIZE,
            Self::Trade => Trade::SIZE,
            Self::OrderResponse => OrderResponse::SIZE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewOrder => "new_order",
            Self::DeleteOrder => "delete_order",
            Self::ModifyOrderQty => "modify_order_qty",
            Self::Trade => "trade",
            Self::OrderResponse => "order_response",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixed-size message body with a known type tag.
pub trait WireMessage: Sized {
    const MESSAGE_TYPE: MessageType;
    /// Encoded size in bytes, tag included.
    const SIZE: usize;

    /// Read the fields that follow the type tag.
    fn decode_fields(buf: &mut &[u8]) -> WireResult<Self>;

    /// Write the fields that follow the type tag.
    fn encode_fields<B: BufMut>(&self, dst: &mut B);

    /// Decode from the front of `src`. Trailing bytes are ignored.
    fn decode(src: &[u8]) -> WireResult<Self> {
        if src.len() < Self::SIZE {
            return Err(WireError::TruncatedMessage {
                needed: Self::SIZE,
                available: src.len(),
            });
        }
        let mut buf = &src[..Self::SIZE];
        let tag = buf.get_u16_le();
        if tag != Self::MESSAGE_TYPE.as_u16() {
            return Err(WireError::UnknownMessageType(tag));
        }
        Self::decode_fields(&mut buf)
    }

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u16_le(Self::MESSAGE_TYPE.as_u16());
        self.encode_fields(dst);
    }
}

/// Request to open a new order (type 1, 35 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrder {
    pub instrument_id: InstrumentId,
    pub order_id: OrderId,
    pub quantity: u64,
    /// Not interpreted by the risk engine.
    pub price: u64,
    pub side: Side,
}

impl WireMessage for NewOrder {
    const MESSAGE_TYPE: MessageType = MessageType::NewOrder;
    const SIZE: usize = 35;

    fn decode_fields(buf: &mut &[u8]) -> WireResult<Self> {
        let instrument_id = InstrumentId(buf.get_u64_le());
        let order_id = OrderId(buf.get_u64_le());
        let quantity = buf.get_u64_le();
        let price = buf.get_u64_le();
        let side = Side::from_byte(buf.get_u8())?;
        Ok(Self {
            instrument_id,
            order_id,
            quantity,
            price,
            side,
        })
    }

    fn encode_fields<B: BufMut>(&self, dst: &mut B) {
        dst.put_u64_le(self.instrument_id.value());
        dst.put_u64_le(self.order_id.value());
        dst.put_u64_le(self.quantity);
        dst.put_u64_le(self.price);
        dst.put_u8(self.side.as_byte());
    }
}

/// Request to remove an open order (type 2, 10 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOrder {
    pub order_id: OrderId,
}

impl WireMessage for DeleteOrder {
    const MESSAGE_TYPE: MessageType = MessageType::DeleteOrder;
    const SIZE: usize = 10;

    fn decode_fields(buf: &mut &[u8]) -> WireResult<Self> {
        Ok(Self {
            order_id: OrderId(buf.get_u64_le()),
        })
    }

    fn encode_fields<B: BufMut>(&self, dst: &mut B) {
        dst.put_u64_le(self.order_id.value());
    }
}

/// Request to change an open order's quantity (type 3, 18 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifyOrderQty {
    pub order_id: OrderId,
    pub new_qty: u64,
}

impl WireMessage for ModifyOrderQty {
    const MESSAGE_TYPE: MessageType = MessageType::ModifyOrderQty;
    const SIZE: usize = 18;

    fn decode_fields(buf: &mut &[u8]) -> WireResult<Self> {
        Ok(Self {
            order_id: OrderId(buf.get_u64_le()),
            new_qty: buf.get_u64_le(),
        })
    }

    fn encode_fields<B: BufMut>(&self, dst: &mut B) {
        dst.put_u64_le(self.order_id.value());
        dst.put_u64_le(self.new_qty);
    }
}

/// Executed trade confirmation (type 4, 34 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade {
    pub instrument_id: InstrumentId,
    pub trade_id: TradeId,
    /// Signed quantity; positive means bought.
    pub quantity: i64,
    pub price: u64,
}

impl WireMessage for Trade {
    const MESSAGE_TYPE: MessageType = MessageType::Trade;
    const SIZE: usize = 34;

    fn decode_fields(buf: &mut &[u8]) -> WireResult<Self> {
        Ok(Self {
            instrument_id: InstrumentId(buf.get_u64_le()),
            trade_id: TradeId(buf.get_u64_le()),
            quantity: buf.get_i64_le(),
            price: buf.get_u64_le(),
        })
    }

    fn encode_fields<B: BufMut>(&self, dst: &mut B) {
        dst.put_u64_le(self.instrument_id.value());
        dst.put_u64_le(self.trade_id.value());
        dst.put_i64_le(self.quantity);
        dst.put_u64_le(self.price);
    }
}

/// Accept/reject answer on the order channel (type 5, 12 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

impl OrderResponse {
    pub fn new(order_id: OrderId, accepted: bool) -> Self {
        Self {
            order_id,
            status: OrderStatus::from_accepted(accepted),
        }
    }
}

impl WireMessage for OrderResponse {
    const MESSAGE_TYPE: MessageType = MessageType::OrderResponse;
    const SIZE: usize = 12;

    fn decode_fields(buf: &mut &[u8]) -> WireResult<Self> {
        let order_id = OrderId(buf.get_u64_le());
        let status = OrderStatus::from_u16(buf.get_u16_le())?;
        Ok(Self { order_id, status })
    }

    fn encode_fields<B: BufMut>(&self, dst: &mut B) {
        dst.put_u64_le(self.order_id.value());
        dst.put_u16_le(self.status.as_u16());
    }
}

/// Any decoded message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    NewOrder(NewOrder),
    DeleteOrder(DeleteOrder),
    ModifyOrderQty(ModifyOrderQty),
    Trade(Trade),
    OrderResponse(OrderResponse),
}

impl Message {
    /// Decode a body from the front of `src`, dispatching on its type tag.
    pub fn decode(src: &[u8]) -> WireResult<Self> {
        if src.len() < MESSAGE_TYPE_SIZE {
            return Err(WireError::TruncatedMessage {
                needed: MESSAGE_TYPE_SIZE,
                available: src.len(),
            });
        }
        let tag = u16::from_le_bytes([src[0], src[1]]);
        match MessageType::from_u16(tag)? {
            MessageType::NewOrder => NewOrder::decode(src).map(Self::NewOrder),
            MessageType::DeleteOrder => DeleteOrder::decode(src).map(Self::DeleteOrder),
            MessageType::ModifyOrderQty => ModifyOrderQty::decode(src).map(Self::ModifyOrderQty),
            MessageType::Trade => Trade::decode(src).map(Self::Trade),
            MessageType::OrderResponse => OrderResponse::decode(src).map(Self::OrderResponse),
        }
    }

    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        match self {
            Self::NewOrder(m) => m.encode(dst),
            Self::DeleteOrder(m) => m.encode(dst),
            Self::ModifyOrderQty(m) => m.encode(dst),
            Self::Trade(m) => m.encode(dst),
            Self::OrderResponse(m) => m.encode(dst),
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Self::NewOrder(_) => MessageType::NewOrder,
            Self::DeleteOrder(_) => MessageType::DeleteOrder,
            Self::ModifyOrderQty(_) => MessageType::ModifyOrderQty,
            Self::Trade(_) => MessageType::Trade,
            Self::OrderResponse(_) => MessageType::OrderResponse,
        }
    }

    pub fn encoded_len(&self) -> usize {
        self.message_type().body_size()
    }
}

impl From<NewOrder> for Message {
    fn from(m: NewOrder) -> Self {
        Self::NewOrder(m)
    }
}

impl From<DeleteOrder> for Message {
    fn from(m: DeleteOrder) -> Self {
        Self::DeleteOrder(m)
    }
}

impl From<ModifyOrderQty> for Message {
    fn from(m: ModifyOrderQty) -> Self {
        Self::ModifyOrderQty(m)
    }
}

impl From<Trade> for Message {
    fn from(m: Trade) -> Self {
        Self::Trade(m)
    }
}

impl From<OrderResponse> for Message {
    fn from(m: OrderResponse) -> Self {
        Self::OrderResponse(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(message: impl Into<Message>) -> Vec<u8> {
        let message = message.into();
        let mut buf = Vec::new();
        message.encode(&mut buf);
        buf
    }

    #[test]
    fn test_new_order_layout() {
        let bytes = encoded(NewOrder {
            instrument_id: InstrumentId(1),
            order_id: OrderId(2),
            quantity: 10,
            price: 100,
            side: Side::Buy,
        });

        assert_eq!(bytes.len(), 35);
        assert_eq!(&bytes[0..2], &[1, 0]);
        assert_eq!(&bytes[2..10], &1u64.to_le_bytes());
        assert_eq!(&bytes[10..18], &2u64.to_le_bytes());
        assert_eq!(&bytes[18..26], &10u64.to_le_bytes());
        assert_eq!(&bytes[26..34], &100u64.to_le_bytes());
        assert_eq!(bytes[34], b'B');
    }

    #[test]
    fn test_body_sizes() {
        let delete = encoded(DeleteOrder { order_id: OrderId(9) });
        let modify = encoded(ModifyOrderQty {
            order_id: OrderId(9),
            new_qty: 3,
        });
        let trade = encoded(Trade {
            instrument_id: InstrumentId(1),
            trade_id: TradeId(4),
            quantity: -5,
            price: 100,
        });
        let response = encoded(OrderResponse::new(OrderId(9), false));

        assert_eq!(delete.len(), 10);
        assert_eq!(modify.len(), 18);
        assert_eq!(trade.len(), 34);
        assert_eq!(response.len(), 12);
        assert_eq!(&response[10..12], &[1, 0]);
    }

    #[test]
    fn test_trade_quantity_is_signed() {
        let bytes = encoded(Trade {
            instrument_id: InstrumentId(1),
            trade_id: TradeId(4),
            quantity: -5,
            price: 100,
        });
        match Message::decode(&bytes).unwrap() {
            Message::Trade(trade) => assert_eq!(trade.quantity, -5),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_decode_truncated_body() {
        let bytes = encoded(DeleteOrder { order_id: OrderId(9) });
        let err = Message::decode(&bytes[..6]).unwrap_err();
        assert!(matches!(
            err,
            WireError::TruncatedMessage {
                needed: 10,
                available: 6
            }
        ));
    }

    #[test]
    fn test_decode_truncated_tag() {
        let err = Message::decode(&[1]).unwrap_err();
        assert!(matches!(err, WireError::TruncatedMessage { needed: 2, .. }));
    }

    #[test]
    fn test_decode_unknown_type() {
        let err = Message::decode(&[9, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, WireError::UnknownMessageType(9)));
    }

    #[test]
    fn test_decode_invalid_side() {
        let mut bytes = encoded(NewOrder {
            instrument_id: InstrumentId(1),
            order_id: OrderId(2),
            quantity: 10,
            price: 100,
            side: Side::Sell,
        });
        bytes[34] = b'X';
        let err = Message::decode(&bytes).unwrap_err();
        assert!(matches!(err, WireError::InvalidSide(b'X')));
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut bytes = encoded(DeleteOrder { order_id: OrderId(9) });
        bytes.extend_from_slice(&[0xff; 4]);
        assert_eq!(
            Message::decode(&bytes).unwrap(),
            Message::DeleteOrder(DeleteOrder { order_id: OrderId(9) })
        );
    }
}
