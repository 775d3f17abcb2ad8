//! LLRP message framing
//!
//! # Message structure
//!
//! ```text
//! ┌─3 bits─┬─3 bits──┬─10 bits─┬──32 bits──┬──32 bits──┬───────────┐
//! │ rsvd=0 │ version │  type   │  length   │    id     │  payload  │
//! └────────┴─────────┴─────────┴───────────┴───────────┴───────────┘
//! ```
//!
//! All fields are big-endian. `length` is the total message size in bytes
//! including the 10-byte header. The payload is an opaque sequence of
//! encoded parameters; interpreting it is deferred to the caller because
//! different message types expect different top-level parameter sets.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{Error, Result};
use crate::parameter::Parameter;
use crate::registry::MessageType;

/// Message header size in bytes
pub const HEADER_SIZE: usize = 10;

/// Protocol version spoken by this profile
pub const PROTOCOL_VERSION: u8 = 1;

/// A framed LLRP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Protocol version (3 bits on the wire)
    pub version: u8,

    /// Message type code (10 bits on the wire)
    pub ty: u16,

    /// Message id, correlating requests and async notifications
    pub id: u32,

    /// Zero or more encoded parameters, concatenated
    pub payload: Bytes,
}

impl Message {
    /// Create a message with the default protocol version
    pub fn new(ty: impl Into<u16>, id: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            ty: ty.into(),
            id,
            payload: payload.into(),
        }
    }

    /// Get the symbolic message name, if the type is registered
    pub fn type_name(&self) -> Option<&'static str> {
        MessageType::try_from(self.ty).ok().map(MessageType::name)
    }

    /// Total encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Decode the payload as a top-level parameter sequence
    pub fn params(&self) -> Result<Vec<Parameter>> {
        Parameter::decode_all(&self.payload)
    }

    /// Encode to bytes
    ///
    /// `length` is recomputed from the payload here; there is no stored
    /// length field that could go stale.
    pub fn encode(&self) -> BytesMut {
        let length = self.encoded_len();
        let mut buf = BytesMut::with_capacity(length);

        buf.put_u8(((self.version & 0x07) << 2) | ((self.ty >> 8) & 0x03) as u8);
        buf.put_u8(self.ty as u8);
        buf.put_u32(length as u32);
        buf.put_u32(self.id);
        buf.put_slice(&self.payload);

        buf
    }

    /// Decode one message from the front of a buffer
    ///
    /// Returns the message and the number of bytes it occupied. Fails with
    /// [`Error::TruncatedMessage`] when the buffer does not yet hold the
    /// whole message; the caller should wait for more input.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::TruncatedMessage {
                needed: HEADER_SIZE,
                available: buf.len(),
            });
        }

        let version = (buf[0] >> 2) & 0x07;
        let ty = ((buf[0] as u16 & 0x03) << 8) | buf[1] as u16;
        let length = u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]) as usize;
        let id = u32::from_be_bytes([buf[6], buf[7], buf[8], buf[9]]);

        if length < HEADER_SIZE {
            return Err(Error::InvalidEncoding(format!(
                "message type {ty} declares length {length}, below its own 10-byte header"
            )));
        }
        if buf.len() < length {
            return Err(Error::TruncatedMessage {
                needed: length,
                available: buf.len(),
            });
        }

        trace!(ty, length, id, "decoded message");

        let message = Self {
            version,
            ty,
            id,
            payload: Bytes::copy_from_slice(&buf[HEADER_SIZE..length]),
        };
        Ok((message, length))
    }

    /// Decode every complete message in a buffer
    ///
    /// A single network read may carry zero, one, or many concatenated
    /// messages. Returns the messages in order plus the number of bytes
    /// consumed; a trailing partial message is left unconsumed for the
    /// caller to re-prepend once more bytes arrive, not treated as an
    /// error. Corrupt length fields still fail, since there is no way to
    /// resynchronize past them.
    pub fn decode_all(buf: &[u8]) -> Result<(Vec<Self>, usize)> {
        let mut messages = Vec::new();
        let mut offset = 0;

        while buf.len() - offset >= HEADER_SIZE {
            match Self::decode(&buf[offset..]) {
                Ok((message, consumed)) => {
                    messages.push(message);
                    offset += consumed;
                }
                Err(Error::TruncatedMessage { .. }) => break,
                Err(e) => return Err(e),
            }
        }

        Ok((messages, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MessageType;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_round_trip() {
        let original = Message::new(MessageType::Keepalive, 42, vec![1, 2, 3]);
        let encoded = original.encode();
        assert_eq!(encoded.len(), 13);

        let (decoded, consumed) = Message::decode(&encoded).unwrap();
        assert_eq!(consumed, 13);
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_header_layout() {
        let message = Message::new(MessageType::CustomMessage, 7, Bytes::new());
        let encoded = message.encode();

        // version 1 in bits 5..3, type 1023 high bits in bits 1..0
        assert_eq!(encoded[0], 0b0000_0111);
        assert_eq!(encoded[1], 0xFF);
        assert_eq!(&encoded[2..6], &10u32.to_be_bytes());
        assert_eq!(&encoded[6..10], &7u32.to_be_bytes());
    }

    #[test]
    fn test_empty_payload() {
        let message = Message::new(MessageType::KeepaliveAck, 0, Bytes::new());
        let encoded = message.encode();
        assert_eq!(encoded.len(), HEADER_SIZE);

        let (decoded, _) = Message::decode(&encoded).unwrap();
        assert_eq!(decoded.payload.len(), 0);
    }

    #[test]
    fn test_decode_all_concatenated() {
        let m1 = Message::new(MessageType::Keepalive, 1, Bytes::new());
        let m2 = Message::new(MessageType::RoAccessReport, 2, vec![0xAA; 5]);

        let mut buf = m1.encode();
        buf.extend_from_slice(&m2.encode());

        let (messages, consumed) = Message::decode_all(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(messages, vec![m1, m2]);
    }

    #[test]
    fn test_decode_all_keeps_partial_remainder() {
        let m1 = Message::new(MessageType::Keepalive, 1, Bytes::new());
        let m2 = Message::new(MessageType::RoAccessReport, 2, vec![0xBB; 20]);

        let mut buf = m1.encode();
        buf.extend_from_slice(&m2.encode());
        let torn = buf.len() - 6;

        let (messages, consumed) = Message::decode_all(&buf[..torn]).unwrap();
        assert_eq!(messages, vec![m1.clone()]);
        assert_eq!(consumed, m1.encoded_len());

        // Completing the buffer yields the second message
        let (rest, consumed) = Message::decode_all(&buf[m1.encoded_len()..]).unwrap();
        assert_eq!(rest, vec![m2]);
        assert_eq!(consumed, 30);
    }

    #[test]
    fn test_truncation_at_every_offset() {
        let encoded = Message::new(MessageType::Keepalive, 9, vec![1, 2, 3, 4]).encode();

        for cut in 0..encoded.len() {
            let result = Message::decode(&encoded[..cut]);
            assert!(
                matches!(result, Err(Error::TruncatedMessage { .. })),
                "cut at {cut} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_declared_length_below_header_is_fatal() {
        let mut encoded = Message::new(MessageType::Keepalive, 0, Bytes::new()).encode();
        encoded[2..6].copy_from_slice(&4u32.to_be_bytes());

        assert!(matches!(
            Message::decode(&encoded),
            Err(Error::InvalidEncoding(_))
        ));
        assert!(matches!(
            Message::decode_all(&encoded),
            Err(Error::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_unknown_type_still_frames() {
        // Type 999 is unregistered; framing must not care
        let message = Message::new(999u16, 3, vec![5, 6]);
        let (decoded, _) = Message::decode(&message.encode()).unwrap();
        assert_eq!(decoded.ty, 999);
        assert_eq!(decoded.type_name(), None);
    }

    proptest! {
        #[test]
        fn prop_round_trip(ty in 0u16..1024, id in any::<u32>(), payload in proptest::collection::vec(any::<u8>(), 0..256)) {
            let original = Message::new(ty, id, payload);
            let (decoded, consumed) = Message::decode(&original.encode()).unwrap();
            prop_assert_eq!(consumed, original.encoded_len());
            prop_assert_eq!(decoded, original);
        }

        #[test]
        fn prop_concatenation(
            a in proptest::collection::vec(any::<u8>(), 0..64),
            b in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let m1 = Message::new(61u16, 1, a);
            let m2 = Message::new(62u16, 2, b);
            let mut buf = m1.encode();
            buf.extend_from_slice(&m2.encode());

            let (messages, consumed) = Message::decode_all(&buf).unwrap();
            prop_assert_eq!(consumed, buf.len());
            prop_assert_eq!(messages, vec![m1, m2]);
        }
    }
}
