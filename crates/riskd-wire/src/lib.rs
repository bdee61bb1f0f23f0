//! Binary wire codec for the riskd order and trade channels.
//!
//! Every inbound frame is a fixed 16-byte [`Header`] followed by exactly
//! `payload_size` bytes of message body. Bodies are fixed-layout with no
//! padding, fields in declared order, all integers little-endian.
//!
//! | Message          | Type | Size |
//! |------------------|------|------|
//! | Header           |  -   |  16  |
//! | NewOrder         |  1   |  35  |
//! | DeleteOrder      |  2   |  10  |
//! | ModifyOrderQty   |  3   |  18  |
//! | Trade            |  4   |  34  |
//! | OrderResponse    |  5   |  12  |
//!
//! Order responses are written back as a bare 12-byte body with no header.

pub mod codec;
pub mod error;
pub mod header;
pub mod message;

pub use codec::{ClientCodec, Decoded, Frame, FrameCodec, DEFAULT_MAX_PAYLOAD_SIZE};
pub use error::{WireError, WireResult};
pub use header::{Header, PROTOCOL_VERSION};
pub use message::{
    DeleteOrder, Message, MessageType, ModifyOrderQty, NewOrder, OrderResponse, Trade,
    WireMessage,
};
