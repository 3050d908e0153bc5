//! Error types for jsonrpc-wire.
//!
//! End of stream is not an error: readers report it as `Ok(None)`.

use thiserror::Error;

/// Main error type for all pipeline operations.
#[derive(Debug, Error)]
pub enum WireError {
    /// The caller declared an encoding the formatter does not accept.
    #[error("Unsupported encoding: {requested} (formatter requires {required})")]
    UnsupportedEncoding {
        /// Encoding supplied by the caller.
        requested: String,
        /// Encoding the formatter requires.
        required: String,
    },

    /// Bytes do not form a valid JSON-RPC message.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// An array payload carried zero messages.
    #[error("Empty batch: received an array payload with no messages")]
    EmptyBatch,

    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Frame length exceeds the configured maximum.
    #[error("Frame size {size} exceeds maximum {max}")]
    FrameTooLarge {
        /// Declared or encoded frame size.
        size: usize,
        /// Configured limit.
        max: usize,
    },

    /// Transport-level protocol violation (bad header, invalid text frame).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The operation was cancelled through its cancellation token.
    #[error("Operation cancelled")]
    Cancelled,

    /// Write attempted after the connection was closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Backpressure timeout - writer queue full.
    #[error("Backpressure timeout")]
    BackpressureTimeout,
}

impl WireError {
    /// Whether this error came from the underlying transport rather than
    /// from message content.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, WireError::Io(_) | WireError::WebSocket(_))
    }

    pub(crate) fn malformed(detail: impl std::fmt::Display) -> Self {
        WireError::MalformedMessage(detail.to_string())
    }
}

/// Result type alias using WireError.
pub type Result<T> = std::result::Result<T, WireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failure_classification() {
        let io = WireError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(io.is_transport_failure());
        assert!(!WireError::EmptyBatch.is_transport_failure());
        assert!(!WireError::malformed("missing method").is_transport_failure());
    }

    #[test]
    fn test_unsupported_encoding_message() {
        let err = WireError::UnsupportedEncoding {
            requested: "utf-16le".into(),
            required: "utf-8".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported encoding: utf-16le (formatter requires utf-8)"
        );
    }
}
