//! Fixed 16-byte frame header.

use crate::error::{WireError, WireResult};
use bytes::{Buf, BufMut};

/// Protocol version written by riskd clients.
pub const PROTOCOL_VERSION: u16 = 1;

/// Frame header preceding every inbound message body.
///
/// `sequence_number` and `timestamp` are carried through untouched; only
/// `payload_size` drives framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub protocol_version: u16,
    /// Size of the body that follows, including its message type tag.
    pub payload_size: u16,
    pub sequence_number: u32,
    /// Sender timestamp, nanoseconds since the Unix epoch.
    pub timestamp: u64,
}

impl Header {
    pub const SIZE: usize = 16;

    pub fn new(payload_size: u16, sequence_number: u32, timestamp: u64) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            payload_size,
            sequence_number,
            timestamp,
        }
    }

    /// Decode a header from the front of `src`.
    pub fn decode(src: &[u8]) -> WireResult<Self> {
        if src.len() < Self::SIZE {
            return Err(WireError::TruncatedMessage {
                needed: Self::SIZE,
                available: src.len(),
            });
        }
        let mut buf = &src[..Self::SIZE];
        Ok(Self {
            protocol_version: buf.get_u16_le(),
            payload_size: buf.get_u16_le(),
            sequence_number: buf.get_u32_le(),
            timestamp: buf.get_u64_le(),
        })
    }

    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u16_le(self.protocol_version);
        dst.put_u16_le(self.payload_size);
        dst.put_u32_le(self.sequence_number);
        dst.put_u64_le(self.timestamp);
    }
}
