//! Dedicated writer task for outbound messages.
//!
//! Many producers share one connection by sending messages through a
//! cloneable [`WriterHandle`]; a single task owns the [`MessageWriter`] and
//! writes them in order.
//!
//! ```text
//! Producer 1 ─┐
//! Producer 2 ─┼─► mpsc::Sender<Message> ─► Writer Task ─► MessageWriter
//! Producer N ─┘
//! ```
//!
//! - **Ordering**: messages leave in the order the channel delivers them
//! - **Backpressure**: pending count tracking with a configurable limit
//! - **Batching** (opt-in): messages already queued when the task wakes are
//!   sent together as one JSON-RPC batch frame

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, WireError};
use crate::formatter::Formatter;
use crate::message::Message;
use crate::pipeline::MessageWriter;
use crate::transport::FrameWriter;

/// Default maximum pending messages before backpressure kicks in.
pub const DEFAULT_MAX_PENDING_MESSAGES: usize = 1024;

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Default backpressure timeout.
pub const DEFAULT_BACKPRESSURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default cap on messages drained per wake-up.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 64;

/// Configuration for the writer task.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Maximum pending messages before backpressure kicks in.
    pub max_pending_messages: usize,
    /// Channel capacity for the message queue.
    pub channel_capacity: usize,
    /// Timeout when waiting for backpressure to clear.
    pub backpressure_timeout: Duration,
    /// Most messages drained from the queue per wake-up.
    pub max_batch_size: usize,
    /// Send drained messages as one batch frame instead of one frame each.
    pub batch_outbound: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_pending_messages: DEFAULT_MAX_PENDING_MESSAGES,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            backpressure_timeout: DEFAULT_BACKPRESSURE_TIMEOUT,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            batch_outbound: false,
        }
    }
}

/// Handle for sending messages to the writer task.
///
/// Cheaply cloneable.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<Message>,
    pending: Arc<AtomicUsize>,
    max_pending: usize,
    timeout: Duration,
}

impl WriterHandle {
    fn new(
        tx: mpsc::Sender<Message>,
        pending: Arc<AtomicUsize>,
        max_pending: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            tx,
            pending,
            max_pending,
            timeout,
        }
    }

    /// Queue a message for the writer task.
    ///
    /// Waits while backpressure is active, failing with `BackpressureTimeout`
    /// after the configured duration. Returns `ConnectionClosed` once the
    /// task has stopped.
    pub async fn send(&self, message: Message) -> Result<()> {
        if self.pending.load(Ordering::Acquire) >= self.max_pending {
            self.wait_for_backpressure().await?;
        }

        // Count before sending so the task never decrements below zero.
        self.pending.fetch_add(1, Ordering::AcqRel);

        self.tx.send(message).await.map_err(|_| {
            self.pending.fetch_sub(1, Ordering::Release);
            WireError::ConnectionClosed
        })
    }

    async fn wait_for_backpressure(&self) -> Result<()> {
        let start = Instant::now();
        let check_interval = Duration::from_micros(100);

        loop {
            if self.pending.load(Ordering::Acquire) < self.max_pending {
                return Ok(());
            }

            if start.elapsed() > self.timeout {
                return Err(WireError::BackpressureTimeout);
            }

            tokio::time::sleep(check_interval).await;
        }
    }

    /// Try to queue a message without waiting.
    ///
    /// Returns `Err(BackpressureTimeout)` immediately if at capacity.
    pub fn try_send(&self, message: Message) -> Result<()> {
        if self.pending.load(Ordering::Acquire) >= self.max_pending {
            return Err(WireError::BackpressureTimeout);
        }

        self.pending.fetch_add(1, Ordering::AcqRel);

        self.tx.try_send(message).map_err(|e| {
            self.pending.fetch_sub(1, Ordering::Release);
            match e {
                mpsc::error::TrySendError::Full(_) => WireError::BackpressureTimeout,
                mpsc::error::TrySendError::Closed(_) => WireError::ConnectionClosed,
            }
        })
    }

    #[inline]
    pub fn is_backpressure_active(&self) -> bool {
        self.pending.load(Ordering::Acquire) >= self.max_pending
    }

    /// Messages queued but not yet written.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

/// Spawn the writer task and return a handle for sending messages.
///
/// The task runs until every handle is dropped or `cancel` fires, then
/// closes the writer. A write error stops the task and is returned through
/// the `JoinHandle`.
pub fn spawn_writer_task<W, F>(
    writer: MessageWriter<W, F>,
    config: WriterConfig,
    cancel: CancellationToken,
) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: FrameWriter + 'static,
    F: Formatter,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let pending = Arc::new(AtomicUsize::new(0));

    let handle = WriterHandle::new(
        tx,
        pending.clone(),
        config.max_pending_messages,
        config.backpressure_timeout,
    );

    let task = tokio::spawn(writer_loop(rx, writer, pending, config, cancel));

    (handle, task)
}

async fn writer_loop<W, F>(
    mut rx: mpsc::Receiver<Message>,
    mut writer: MessageWriter<W, F>,
    pending: Arc<AtomicUsize>,
    config: WriterConfig,
    cancel: CancellationToken,
) -> Result<()>
where
    W: FrameWriter,
    F: Formatter,
{
    let max_batch = config.max_batch_size.max(1);

    loop {
        let first = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            message = rx.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        // Collect additional ready messages (non-blocking)
        let mut batch = Vec::with_capacity(max_batch);
        batch.push(first);
        while batch.len() < max_batch {
            match rx.try_recv() {
                Ok(message) => batch.push(message),
                Err(_) => break,
            }
        }

        let batch_size = batch.len();
        let written = if config.batch_outbound && batch_size > 1 {
            writer.write_batch(&batch, &cancel).await
        } else {
            write_each(&mut writer, &batch, &cancel).await
        };
        pending.fetch_sub(batch_size, Ordering::Release);

        if let Err(e) = written {
            tracing::error!(error = %e, batch_size, "writer task stopped");
            if let Err(close_err) = writer.close().await {
                tracing::debug!(error = %close_err, "close after write failure failed");
            }
            return Err(e);
        }
    }

    tracing::debug!("writer task finished, closing transport");
    writer.close().await
}

async fn write_each<W, F>(
    writer: &mut MessageWriter<W, F>,
    batch: &[Message],
    cancel: &CancellationToken,
) -> Result<()>
where
    W: FrameWriter,
    F: Formatter,
{
    for message in batch {
        writer.write_message(message, cancel).await?;
    }
    Ok(())
}
