//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management.
//! Implements a state machine for handling fragmented frames:
//! - `WaitingForHeader`: Need at least 4 bytes
//! - `WaitingForPayload`: Header parsed, need N more content bytes
//!
//! The buffer outlives individual read calls, so a read that is abandoned
//! halfway keeps every byte it already received and the next read resumes
//! the same frame.
//!
//! # Example
//!
//! ```
//! use jsonrpc_wire::protocol::FrameBuffer;
//!
//! let mut buffer = FrameBuffer::new();
//! let frames = buffer.push(&[0, 0, 0, 2, b'{', b'}']).unwrap();
//! assert_eq!(frames[0].payload(), b"{}");
//! ```

use bytes::BytesMut;

use super::wire_format::{LengthHeader, DEFAULT_MAX_FRAME_SIZE, HEADER_SIZE};
use super::Frame;
use crate::error::{Result, WireError};

/// State machine for frame parsing.
#[derive(Debug, Clone, Copy)]
enum State {
    /// Waiting for complete header (need 4 bytes).
    WaitingForHeader,
    /// Header parsed, waiting for content bytes.
    WaitingForPayload { remaining: usize },
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
pub struct FrameBuffer {
    /// Accumulated bytes from stream reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum allowed content size.
    max_frame_size: usize,
}

impl FrameBuffer {
    /// Create a new frame buffer with default settings.
    ///
    /// Default capacity: 64KB, max frame: 100MB.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a new frame buffer with a custom max frame size.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            state: State::WaitingForHeader,
            max_frame_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Partial data is buffered internally for the next push.
    ///
    /// # Errors
    ///
    /// Returns `FrameTooLarge` if a header declares more than the maximum.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Try to extract a single frame from the buffered bytes.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame was extracted
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` if the header declares an oversized frame
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            match self.state {
                State::WaitingForHeader => {
                    let Some(header) = LengthHeader::decode(&self.buffer) else {
                        return Ok(None);
                    };

                    if header.len() > self.max_frame_size {
                        return Err(WireError::FrameTooLarge {
                            size: header.len(),
                            max: self.max_frame_size,
                        });
                    }

                    let _ = self.buffer.split_to(HEADER_SIZE);
                    self.state = State::WaitingForPayload {
                        remaining: header.len(),
                    };
                }

                State::WaitingForPayload { remaining } => {
                    if self.buffer.len() < remaining {
                        return Ok(None);
                    }

                    // Zero-copy freeze
                    let payload = self.buffer.split_to(remaining).freeze();
                    self.state = State::WaitingForHeader;
                    return Ok(Some(Frame::new(payload)));
                }
            }
        }
    }

    /// Reserve room for at least `additional` bytes and return the buffer
    /// for a direct read.
    pub(crate) fn read_target(&mut self, additional: usize) -> &mut BytesMut {
        self.buffer.reserve(additional);
        &mut self.buffer
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether part of a frame has been received but not yet completed.
    pub fn is_mid_frame(&self) -> bool {
        !self.buffer.is_empty() || matches!(self.state, State::WaitingForPayload { .. })
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForHeader;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::WaitingForHeader => "WaitingForHeader",
            State::WaitingForPayload { .. } => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
