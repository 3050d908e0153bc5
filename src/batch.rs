//! Inbound batch unwrapping.
//!
//! A JSON-RPC batch arrives as one frame holding an array of messages. The
//! [`Unbatcher`] decodes the whole array up front, queues the messages in
//! arrival order and hands them out one per read, so callers only ever see
//! single messages.
//!
//! Batches are all-or-nothing: if any element fails to decode, nothing from
//! that frame is queued.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{Result, WireError};
use crate::formatter::{Encoding, Formatter};
use crate::message::Message;
use crate::transport::FrameReader;

/// Reads single messages from a frame reader, unwrapping array frames.
pub struct Unbatcher<R, F> {
    reader: R,
    formatter: Arc<F>,
    pending: VecDeque<Message>,
}

impl<R, F> Unbatcher<R, F>
where
    R: FrameReader,
    F: Formatter,
{
    /// Wrap `reader`, decoding with `formatter`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedEncoding` for a text formatter whose encoding is
    /// not UTF-8.
    pub fn new(reader: R, formatter: Arc<F>) -> Result<Self> {
        if let Some(encoding) = formatter.encoding() {
            if encoding != Encoding::Utf8 {
                return Err(WireError::UnsupportedEncoding {
                    requested: encoding.name().to_string(),
                    required: Encoding::Utf8.name().to_string(),
                });
            }
        }

        Ok(Self {
            reader,
            formatter,
            pending: VecDeque::new(),
        })
    }

    /// Read the next message.
    ///
    /// Queued batch elements are returned first, without touching the
    /// transport. Returns `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// - `EmptyBatch` for an array frame with no elements
    /// - `MalformedMessage` if the frame or any batch element is invalid
    /// - transport errors and `Cancelled` from the frame reader
    pub async fn read_message(&mut self, cancel: &CancellationToken) -> Result<Option<Message>> {
        if let Some(message) = self.pending.pop_front() {
            return Ok(Some(message));
        }

        let Some(frame) = self.reader.read_frame(cancel).await? else {
            return Ok(None);
        };

        let Some(elements) = self.formatter.split_batch(frame.payload())? else {
            return self.formatter.decode(frame.payload()).map(Some);
        };

        if elements.is_empty() {
            return Err(WireError::EmptyBatch);
        }

        let messages = elements
            .iter()
            .map(|element| self.formatter.decode(element))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(count = messages.len(), "unwrapped inbound batch");

        self.pending.extend(messages);
        Ok(self.pending.pop_front())
    }

    /// Messages already decoded and waiting to be returned.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn formatter(&self) -> &F {
        &self.formatter
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{JsonFormatter, MsgPackFormatter};
    use crate::message::{Notification, Request, RequestId};
    use crate::protocol::Frame;
    use std::collections::VecDeque;

    /// Hands out scripted frames and counts transport reads.
    struct ScriptedFrames {
        frames: VecDeque<&'static [u8]>,
        reads: usize,
    }

    impl ScriptedFrames {
        fn new(frames: impl IntoIterator<Item = &'static [u8]>) -> Self {
            Self {
                frames: frames.into_iter().collect(),
                reads: 0,
            }
        }
    }

    impl FrameReader for ScriptedFrames {
        async fn read_frame(&mut self, _cancel: &CancellationToken) -> Result<Option<Frame>> {
            self.reads += 1;
            Ok(self.frames.pop_front().map(Frame::from_slice))
        }
    }

    fn unbatcher(frames: impl IntoIterator<Item = &'static [u8]>) -> Unbatcher<ScriptedFrames, JsonFormatter> {
        Unbatcher::new(ScriptedFrames::new(frames), Arc::new(JsonFormatter::new())).unwrap()
    }

    fn method(message: Option<Message>) -> String {
        message.unwrap().method().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_single_message_passthrough() {
        let mut reader = unbatcher([&br#"{"jsonrpc":"2.0","method":"ping"}"#[..]]);
        let cancel = CancellationToken::new();

        let message = reader.read_message(&cancel).await.unwrap().unwrap();
        assert_eq!(message, Notification::new("ping", None).into());
        assert!(reader.read_message(&cancel).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_batch_served_in_order_from_one_read() {
        let mut reader = unbatcher([&br#"[{"jsonrpc":"2.0","method":"a"},{"jsonrpc":"2.0","method":"b"},{"jsonrpc":"2.0","method":"c"}]"#[..]]);
        let cancel = CancellationToken::new();

        assert_eq!(method(reader.read_message(&cancel).await.unwrap()), "a");
        assert_eq!(reader.pending(), 2);
        assert_eq!(method(reader.read_message(&cancel).await.unwrap()), "b");
        assert_eq!(method(reader.read_message(&cancel).await.unwrap()), "c");
        assert_eq!(reader.get_ref().reads, 1);

        assert!(reader.read_message(&cancel).await.unwrap().is_none());
        assert_eq!(reader.get_ref().reads, 2);
    }

    #[tokio::test]
    async fn test_batch_of_requests_keeps_ids() {
        let mut reader = unbatcher([&br#"[{"jsonrpc":"2.0","id":1,"method":"x"},{"jsonrpc":"2.0","id":2,"method":"y"}]"#[..]]);
        let cancel = CancellationToken::new();

        let first = reader.read_message(&cancel).await.unwrap().unwrap();
        let second = reader.read_message(&cancel).await.unwrap().unwrap();
        assert_eq!(first, Request::new(1, "x", None).into());
        assert_eq!(second.id(), Some(&RequestId::Number(2)));
    }

    #[tokio::test]
    async fn test_empty_batch_fails_without_another_read() {
        let mut reader = unbatcher([&b" []"[..], &br#"{"jsonrpc":"2.0","method":"later"}"#[..]]);
        let cancel = CancellationToken::new();

        let result = reader.read_message(&cancel).await;
        assert!(matches!(result, Err(WireError::EmptyBatch)));
        assert_eq!(reader.get_ref().reads, 1);

        assert_eq!(method(reader.read_message(&cancel).await.unwrap()), "later");
    }

    #[tokio::test]
    async fn test_malformed_element_discards_whole_batch() {
        let mut reader = unbatcher([&br#"[{"jsonrpc":"2.0","method":"ok"},{"jsonrpc":"2.0"}]"#[..]]);
        let cancel = CancellationToken::new();

        let result = reader.read_message(&cancel).await;
        assert!(matches!(result, Err(WireError::MalformedMessage(_))));
        assert_eq!(reader.pending(), 0);
        assert!(reader.read_message(&cancel).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_frame_is_error() {
        let mut reader = unbatcher([&b"{not json"[..]]);
        let cancel = CancellationToken::new();

        let result = reader.read_message(&cancel).await;
        assert!(matches!(result, Err(WireError::MalformedMessage(_))));
    }

    #[tokio::test]
    async fn test_msgpack_batch() {
        let formatter = MsgPackFormatter::new();
        let batch: &'static [u8] = Box::leak(
            formatter
                .encode_batch(&[
                    Notification::new("a", None).into(),
                    Notification::new("b", None).into(),
                ])
                .to_vec()
                .into_boxed_slice(),
        );
        let mut reader = Unbatcher::new(ScriptedFrames::new([batch]), Arc::new(formatter)).unwrap();
        let cancel = CancellationToken::new();

        assert_eq!(method(reader.read_message(&cancel).await.unwrap()), "a");
        assert_eq!(method(reader.read_message(&cancel).await.unwrap()), "b");
        assert_eq!(reader.get_ref().reads, 1);
    }

    struct Utf16Json;

    impl Formatter for Utf16Json {
        fn encoding(&self) -> Option<Encoding> {
            Some(Encoding::Utf16Le)
        }

        fn encode(&self, message: &Message) -> bytes::Bytes {
            JsonFormatter::new().encode(message)
        }

        fn encode_batch(&self, messages: &[Message]) -> bytes::Bytes {
            JsonFormatter::new().encode_batch(messages)
        }

        fn decode(&self, payload: &[u8]) -> Result<Message> {
            JsonFormatter::new().decode(payload)
        }

        fn split_batch(&self, payload: &[u8]) -> Result<Option<Vec<bytes::Bytes>>> {
            JsonFormatter::new().split_batch(payload)
        }
    }

    #[test]
    fn test_rejects_non_utf8_text_formatter() {
        let result = Unbatcher::new(ScriptedFrames::new([]), Arc::new(Utf16Json));
        assert!(matches!(
            result,
            Err(WireError::UnsupportedEncoding { ref requested, .. }) if requested == "utf-16le"
        ));
    }
}
