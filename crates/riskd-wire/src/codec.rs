//! Stream framing on top of `tokio_util::codec`.
//!
//! [`FrameCodec`] is the server side: it decodes header-delimited request
//! frames and encodes bare order responses. [`ClientCodec`] is the mirror
//! image used by clients.
//!
//! Framing is driven by `Header::payload_size`. The decoder always consumes
//! exactly `16 + payload_size` bytes per frame, so a body that fails to decode
//! is dropped without losing alignment. Only an oversized declared payload or
//! EOF in the middle of a frame leaves the stream unusable.

use crate::error::{WireError, WireResult};
use crate::header::Header;
use crate::message::{Message, OrderResponse, WireMessage};
use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

/// Largest payload accepted by default. Comfortably above the largest body.
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 64;

/// A header plus its decoded body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub header: Header,
    pub message: Message,
}

impl Frame {
    /// Build a frame whose header declares the exact body size.
    pub fn new(message: impl Into<Message>, sequence_number: u32, timestamp: u64) -> Self {
        let message = message.into();
        // Largest body is 35 bytes.
        let payload_size = message.encoded_len() as u16;
        Self {
            header: Header::new(payload_size, sequence_number, timestamp),
            message,
        }
    }

    pub fn encoded_len(&self) -> usize {
        Header::SIZE + usize::from(self.header.payload_size)
    }
}

/// Outcome of decoding one aligned frame.
#[derive(Debug)]
pub enum Decoded {
    /// Body decoded cleanly and matches its declared size.
    Frame(Frame),
    /// Frame consumed but its body was unusable; the stream is still aligned.
    Rejected { header: Header, error: WireError },
}

/// Server-side codec: request frames in, order responses out.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_payload_size: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::with_max_payload_size(DEFAULT_MAX_PAYLOAD_SIZE)
    }

    pub fn with_max_payload_size(max_payload_size: usize) -> Self {
        Self { max_payload_size }
    }

    /// Bytes needed to complete the frame at the front of `src`.
    fn pending_len(src: &[u8]) -> usize {
        match Header::decode(src) {
            Ok(header) => Header::SIZE + usize::from(header.payload_size),
            Err(_) => Header::SIZE,
        }
    }

    fn decode_body(header: &Header, body: &[u8]) -> WireResult<Message> {
        let message = Message::decode(body)?;
        let expected = message.encoded_len();
        if body.len() != expected {
            return Err(WireError::PayloadSizeMismatch {
                message_type: message.message_type().as_u16(),
                declared: usize::from(header.payload_size),
                expected,
            });
        }
        Ok(message)
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Decoded;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < Header::SIZE {
            src.reserve(Header::SIZE - src.len());
            return Ok(None);
        }

        let header = Header::decode(src)?;
        let payload_size = usize::from(header.payload_size);
        if payload_size > self.max_payload_size {
            return Err(WireError::FrameTooLarge {
                declared: payload_size,
                max: self.max_payload_size,
            });
        }

        let frame_len = Header::SIZE + payload_size;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(frame_len);
        frame.advance(Header::SIZE);
        trace!(
            sequence_number = header.sequence_number,
            payload_size,
            "Frame received"
        );

        match Self::decode_body(&header, &frame) {
            Ok(message) => Ok(Some(Decoded::Frame(Frame { header, message }))),
            Err(error) => Ok(Some(Decoded::Rejected { header, error })),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(decoded) => Ok(Some(decoded)),
            None if src.is_empty() => Ok(None),
            None => Err(WireError::TruncatedMessage {
                needed: Self::pending_len(src),
                available: src.len(),
            }),
        }
    }
}

impl Encoder<OrderResponse> for FrameCodec {
    type Error = WireError;

    fn encode(&mut self, item: OrderResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(OrderResponse::SIZE);
        item.encode(dst);
        Ok(())
    }
}

/// Client-side codec: request frames out, order responses in.
#[derive(Debug, Clone, Default)]
pub struct ClientCodec;

impl Encoder<Frame> for ClientCodec {
    type Error = WireError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.encoded_len());
        item.header.encode(dst);
        item.message.encode(dst);
        Ok(())
    }
}

impl Decoder for ClientCodec {
    type Item = OrderResponse;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < OrderResponse::SIZE {
            src.reserve(OrderResponse::SIZE - src.len());
            return Ok(None);
        }
        let bytes = src.split_to(OrderResponse::SIZE);
        OrderResponse::decode(&bytes).map(Some)
    }
}
