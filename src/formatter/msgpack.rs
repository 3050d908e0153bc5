//! MsgPack formatter using `rmp-serde`.
//!
//! **CRITICAL**: Always use `to_vec_named`, NEVER `to_vec`!
//! Message documents must stay maps keyed by member name (`jsonrpc`, `id`,
//! `method`, ...) so peers using other MessagePack libraries can read them.
//!
//! This is a binary formatter: it declares no text encoding, and a
//! WebSocket pipeline sends its frames as binary messages.

use bytes::Bytes;
use serde_json::Value;

use super::Formatter;
use crate::error::{Result, WireError};
use crate::message::Message;

/// fixarray (0x90-0x9f), array16 (0xdc), array32 (0xdd).
fn is_array_marker(byte: u8) -> bool {
    matches!(byte, 0x90..=0x9f | 0xdc | 0xdd)
}

/// JSON-RPC formatter for MessagePack.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackFormatter;

impl MsgPackFormatter {
    pub fn new() -> Self {
        MsgPackFormatter
    }
}

impl Formatter for MsgPackFormatter {
    fn encode(&self, message: &Message) -> Bytes {
        // CRITICAL: to_vec_named, NOT to_vec!
        let bytes =
            rmp_serde::to_vec_named(message).expect("a Message always serializes to MsgPack");
        Bytes::from(bytes)
    }

    fn encode_batch(&self, messages: &[Message]) -> Bytes {
        let bytes =
            rmp_serde::to_vec_named(messages).expect("a Message always serializes to MsgPack");
        Bytes::from(bytes)
    }

    fn decode(&self, payload: &[u8]) -> Result<Message> {
        let value: Value = rmp_serde::from_slice(payload).map_err(WireError::malformed)?;
        Message::try_from(value)
    }

    fn split_batch(&self, payload: &[u8]) -> Result<Option<Vec<Bytes>>> {
        match payload.first() {
            Some(&byte) if is_array_marker(byte) => {}
            _ => return Ok(None),
        }

        let elements: Vec<Value> = rmp_serde::from_slice(payload).map_err(WireError::malformed)?;
        let documents = elements
            .iter()
            .map(|element| {
                let bytes = rmp_serde::to_vec_named(element)
                    .expect("a JSON value always serializes to MsgPack");
                Bytes::from(bytes)
            })
            .collect();
        Ok(Some(documents))
    }
}
