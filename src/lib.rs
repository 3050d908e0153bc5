//! # jsonrpc-wire
//!
//! Transport layer for JSON-RPC 2.0: turns a raw connection into a
//! bidirectional channel of whole JSON-RPC messages.
//!
//! ## Architecture
//!
//! - **Formatting**: message ↔ bytes ([`formatter::JsonFormatter`],
//!   [`formatter::MsgPackFormatter`])
//! - **Framing**: where one message ends and the next begins
//!   (4-byte length prefix on byte streams, one message per packet on
//!   WebSockets)
//! - **Unbatching**: an inbound array frame is served as single messages
//!   ([`batch::Unbatcher`])
//!
//! [`pipeline::PipelineBuilder`] composes one of each per connection.
//! Dispatching, method routing and connection setup live elsewhere.
//!
//! ## Example
//!
//! ```
//! use jsonrpc_wire::formatter::JsonFormatter;
//! use jsonrpc_wire::message::{Message, Request, SuccessResponse};
//! use jsonrpc_wire::PipelineBuilder;
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> jsonrpc_wire::Result<()> {
//! let (a, b) = tokio::io::duplex(4096);
//! let mut client = PipelineBuilder::new().length_prefixed(a, JsonFormatter::new())?;
//! let mut server = PipelineBuilder::new().length_prefixed(b, JsonFormatter::new())?;
//! let cancel = CancellationToken::new();
//!
//! client.write_message(&Request::new(1, "echo", None).into(), &cancel).await?;
//! if let Some(Message::Request(request)) = server.read_message(&cancel).await? {
//!     let reply = SuccessResponse::new(request.id, json!("ok"));
//!     server.write_message(&reply.into(), &cancel).await?;
//! }
//!
//! let reply = client.read_message(&cancel).await?;
//! assert!(reply.unwrap().is_response());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod error;
pub mod formatter;
pub mod message;
pub mod pipeline;
pub mod protocol;
pub mod transport;
pub mod writer;

pub use batch::Unbatcher;
pub use error::{Result, WireError};
pub use formatter::{Encoding, Formatter, JsonFormatter, MsgPackFormatter, TextFormatter};
pub use message::{ErrorResponse, Message, Notification, Request, RequestId, SuccessResponse};
pub use pipeline::{MessagePipeline, MessageWriter, PipelineBuilder, PipelineConfig};
pub use writer::{spawn_writer_task, WriterConfig, WriterHandle};
