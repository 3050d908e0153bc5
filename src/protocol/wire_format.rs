//! Length header encoding and decoding.
//!
//! Implements the 4-byte length header used on duplex streams:
//! ```text
//! ┌───────────────┬──────────────────────────┐
//! │ Length        │ Content                  │
//! │ 4 bytes       │ `Length` bytes           │
//! │ uint32 BE     │ one message or an array  │
//! └───────────────┴──────────────────────────┘
//! ```

use crate::error::{Result, WireError};

/// Header size in bytes (fixed, exactly 4).
pub const HEADER_SIZE: usize = 4;

/// Default maximum frame content size (100 MB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 100 * 1024 * 1024;

/// Largest content length the header can express.
pub const ABSOLUTE_MAX_FRAME_SIZE: usize = u32::MAX as usize;

/// Decoded length header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthHeader {
    /// Content length in bytes.
    pub content_length: u32,
}

impl LengthHeader {
    /// Header for a payload of `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns `FrameTooLarge` if `len` exceeds `max` or cannot be
    /// represented in 32 bits.
    pub fn for_payload(len: usize, max: usize) -> Result<Self> {
        let limit = max.min(ABSOLUTE_MAX_FRAME_SIZE);
        if len > limit {
            return Err(WireError::FrameTooLarge { size: len, max: limit });
        }
        Ok(Self {
            content_length: len as u32,
        })
    }

    /// Encode header to bytes (Big Endian).
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        self.content_length.to_be_bytes()
    }

    /// Decode a header from the first `HEADER_SIZE` bytes.
    ///
    /// Returns `None` if fewer bytes are available.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let bytes: [u8; HEADER_SIZE] = buf.get(..HEADER_SIZE)?.try_into().ok()?;
        Some(Self {
            content_length: u32::from_be_bytes(bytes),
        })
    }

    /// Content length as `usize`.
    #[inline]
    pub fn len(&self) -> usize {
        self.content_length as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content_length == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_big_endian() {
        let header = LengthHeader::for_payload(33, DEFAULT_MAX_FRAME_SIZE).unwrap();
        assert_eq!(header.encode(), [0, 0, 0, 33]);

        let header = LengthHeader::for_payload(0x0102_0304, usize::MAX).unwrap();
        assert_eq!(header.encode(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_decode_needs_four_bytes() {
        assert_eq!(LengthHeader::decode(&[0, 0, 1]), None);
        let header = LengthHeader::decode(&[0, 0, 1, 0, 0xFF]).unwrap();
        assert_eq!(header.len(), 256);
    }

    #[test]
    fn test_for_payload_respects_limit() {
        let result = LengthHeader::for_payload(101, 100);
        assert!(matches!(
            result,
            Err(WireError::FrameTooLarge { size: 101, max: 100 })
        ));
    }
}
