//! Formatter module - conversion between [`Message`] values and wire bytes.
//!
//! This module provides formatters for two wire formats:
//!
//! - [`JsonFormatter`] - JSON text, UTF-8 without BOM
//! - [`MsgPackFormatter`] - MessagePack using `rmp-serde` (`to_vec_named`, struct-as-map)
//!
//! # Design
//!
//! Formatters know nothing about framing. A frame reader hands them the bytes
//! of one frame; the pipeline picks the formatter at construction time and
//! composes it with any frame reader/writer through generics.
//!
//! # Example
//!
//! ```
//! use jsonrpc_wire::formatter::{Formatter, JsonFormatter};
//! use jsonrpc_wire::message::{Message, Notification};
//!
//! let formatter = JsonFormatter::new();
//! let msg: Message = Notification::new("ping", None).into();
//! let bytes = formatter.encode(&msg);
//! assert_eq!(formatter.decode(&bytes).unwrap(), msg);
//! ```

mod encoding;
mod json;
mod msgpack;

pub use encoding::Encoding;
pub use json::JsonFormatter;
pub use msgpack::MsgPackFormatter;

use bytes::Bytes;

use crate::error::Result;
use crate::message::Message;

/// Converts messages to bytes and back in one wire format.
pub trait Formatter: Send + Sync + 'static {
    /// Text encoding this formatter requires. Binary formatters return `None`.
    fn encoding(&self) -> Option<Encoding> {
        None
    }

    /// Encode one message. Never fails for a structurally valid message.
    fn encode(&self, message: &Message) -> Bytes;

    /// Encode several messages as one array payload.
    fn encode_batch(&self, messages: &[Message]) -> Bytes;

    /// Decode the payload of one frame into a message.
    ///
    /// Textual formatters decode with their own required encoding.
    ///
    /// # Errors
    ///
    /// Returns `MalformedMessage` if the bytes are not a valid message.
    fn decode(&self, payload: &[u8]) -> Result<Message>;

    /// Split an array payload into standalone element documents.
    ///
    /// Returns `Ok(None)` when the payload is not an array, so the caller
    /// decodes it as a single message. Each returned element can be fed to
    /// [`Formatter::decode`] unchanged.
    fn split_batch(&self, payload: &[u8]) -> Result<Option<Vec<Bytes>>>;

    /// Pretty-printed rendering for diagnostics. Never used on the wire.
    fn render_text(&self, message: &Message) -> String {
        serde_json::to_string_pretty(message).expect("a Message always renders as JSON text")
    }
}

/// A formatter that produces text in a declared encoding.
pub trait TextFormatter: Formatter {
    /// Decode with a caller-declared encoding.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedEncoding` when `encoding` differs from the
    /// formatter's required encoding, whatever the payload.
    fn decode_with_encoding(&self, payload: &[u8], encoding: Encoding) -> Result<Message>;
}
