//! Frame struct.
//!
//! A frame is the raw content of exactly one transport-level transmission
//! unit, before any formatter has looked at it. Uses `bytes::Bytes` so a
//! payload split off a read buffer is shared, not copied.
//!
//! # Example
//!
//! ```
//! use jsonrpc_wire::protocol::Frame;
//! use bytes::Bytes;
//!
//! let frame = Frame::new(Bytes::from_static(b"{}"));
//! assert_eq!(frame.payload(), b"{}");
//! assert_eq!(frame.len(), 2);
//! ```

use bytes::Bytes;

/// Raw content of one wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Bytes,
}

impl Frame {
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    /// Create a frame from raw bytes (copies data).
    pub fn from_slice(payload: &[u8]) -> Self {
        Self {
            payload: Bytes::copy_from_slice(payload),
        }
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Consume the frame and return its payload.
    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.payload
    }
}

impl From<Bytes> for Frame {
    fn from(payload: Bytes) -> Self {
        Frame::new(payload)
    }
}

/// Build length header + content as one contiguous buffer.
///
/// Writers use scatter/gather I/O instead; this is for tests and callers
/// that need the exact bytes on the wire.
pub fn build_length_prefixed(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(super::HEADER_SIZE + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}
