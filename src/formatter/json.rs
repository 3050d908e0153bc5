//! JSON formatter using `serde_json`.
//!
//! Always writes and reads UTF-8 without a byte order mark. Any other
//! declared encoding is rejected, never substituted.

use bytes::Bytes;
use serde_json::Value;

use super::{Encoding, Formatter, TextFormatter};
use crate::error::{Result, WireError};
use crate::message::Message;

const ARRAY_OPEN: u8 = b'[';

/// JSON-RPC formatter for JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// The only encoding this formatter accepts.
    pub const REQUIRED_ENCODING: Encoding = Encoding::Utf8;

    pub fn new() -> Self {
        JsonFormatter
    }

    /// Create a formatter for an explicitly chosen encoding.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedEncoding` for anything but UTF-8.
    pub fn with_encoding(encoding: Encoding) -> Result<Self> {
        check_encoding(encoding)?;
        Ok(JsonFormatter)
    }
}

fn check_encoding(encoding: Encoding) -> Result<()> {
    if encoding.name() != JsonFormatter::REQUIRED_ENCODING.name() {
        return Err(WireError::UnsupportedEncoding {
            requested: encoding.name().to_string(),
            required: JsonFormatter::REQUIRED_ENCODING.name().to_string(),
        });
    }
    Ok(())
}

/// First byte that is not JSON whitespace.
fn first_significant_byte(payload: &[u8]) -> Option<u8> {
    payload
        .iter()
        .copied()
        .find(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

impl Formatter for JsonFormatter {
    fn encoding(&self) -> Option<Encoding> {
        Some(Self::REQUIRED_ENCODING)
    }

    fn encode(&self, message: &Message) -> Bytes {
        let bytes = serde_json::to_vec(message).expect("a Message always serializes to JSON");
        Bytes::from(bytes)
    }

    fn encode_batch(&self, messages: &[Message]) -> Bytes {
        let bytes = serde_json::to_vec(messages).expect("a Message always serializes to JSON");
        Bytes::from(bytes)
    }

    fn decode(&self, payload: &[u8]) -> Result<Message> {
        self.decode_with_encoding(payload, Self::REQUIRED_ENCODING)
    }

    fn split_batch(&self, payload: &[u8]) -> Result<Option<Vec<Bytes>>> {
        if first_significant_byte(payload) != Some(ARRAY_OPEN) {
            return Ok(None);
        }

        let elements: Vec<Value> = serde_json::from_slice(payload).map_err(WireError::malformed)?;
        let documents = elements
            .iter()
            .map(|element| {
                Bytes::from(serde_json::to_vec(element).expect("a JSON value always serializes"))
            })
            .collect();
        Ok(Some(documents))
    }
}

impl TextFormatter for JsonFormatter {
    fn decode_with_encoding(&self, payload: &[u8], encoding: Encoding) -> Result<Message> {
        check_encoding(encoding)?;
        let value: Value = serde_json::from_slice(payload).map_err(WireError::malformed)?;
        Message::try_from(value)
    }
}
