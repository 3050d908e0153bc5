//! Protocol module - length-prefixed wire format and frame types.
//!
//! - 4-byte big-endian length header
//! - Frame buffer for accumulating partial reads
//! - Frame struct holding the raw content of one transmission unit

mod frame;
mod frame_buffer;
mod wire_format;

pub use frame::{build_length_prefixed, Frame};
pub use frame_buffer::FrameBuffer;
pub use wire_format::{LengthHeader, ABSOLUTE_MAX_FRAME_SIZE, DEFAULT_MAX_FRAME_SIZE, HEADER_SIZE};
