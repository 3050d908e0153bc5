//! Transport module - frame demarcation over concrete transports.
//!
//! Two strategies:
//! - [`LengthPrefixedReader`] / [`LengthPrefixedWriter`] - 4-byte length
//!   header over any tokio duplex byte stream
//! - [`PacketFrameReader`] / [`PacketFrameWriter`] - one message per
//!   packet-socket transmission unit, assembled from partial receives
//!   (WebSocket via [`websocket::split`])
//!
//! Readers and writers are separate values, so one in-flight read and one
//! in-flight write can run concurrently while two reads (or two writes) on the
//! same instance cannot: every operation takes `&mut self`.

pub(crate) mod packet;
mod stream;
pub mod websocket;

pub use packet::{
    Fragment, PacketFrameReader, PacketFrameWriter, PacketKind, PacketReceiver, PacketSender,
    DEFAULT_RECEIVE_SIZE_HINT,
};
pub use stream::{LengthPrefixedReader, LengthPrefixedWriter};

use std::future::Future;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::protocol::Frame;

/// Reads whole frames from a transport.
pub trait FrameReader: Send {
    /// Read the next complete frame.
    ///
    /// Returns `Ok(None)` at end of stream: peer close, empty payload or an
    /// exhausted stream. Once end of stream is reported, later calls report
    /// it again without touching the transport.
    fn read_frame(
        &mut self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Option<Frame>>> + Send;
}

/// Writes whole frames to a transport.
pub trait FrameWriter: Send {
    /// Send one frame as one transmission unit.
    ///
    /// Under cancellation the write is best-effort: part of the frame may
    /// already have reached the peer.
    fn write_frame(
        &mut self,
        payload: Bytes,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Release the transport. Repeated calls are no-ops.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
