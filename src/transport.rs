//! Async delivery of emitted chunks.
//!
//! The streamer's callback must not block, so the binary pushes each chunk
//! into an unbounded `tokio::sync::mpsc` channel and [`forward_chunks`]
//! drains it on the runtime, wrapping every chunk in a
//! [`ClientMessage::Audio`] and closing the stream with the stop marker.
//!
//! ```text
//! MicStreamer::on_chunk ──tx.send──▶ mpsc ──▶ forward_chunks ──▶ ChunkTransport
//!                                                 │
//!                                  channel closed └─▶ {"eventType":"stop"}
//! ```

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::protocol::ClientMessage;

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialise message: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// ChunkTransport trait
// ---------------------------------------------------------------------------

/// Destination for client messages.
#[async_trait]
pub trait ChunkTransport: Send {
    async fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError>;

    /// Flush buffered output.  Default: nothing to flush.
    async fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonLinesTransport
// ---------------------------------------------------------------------------

/// Writes one JSON message per line to any async writer.
pub struct JsonLinesTransport<W> {
    writer: W,
    sent: u64,
}

impl<W> JsonLinesTransport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, sent: 0 }
    }

    /// Messages written so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> ChunkTransport for JsonLinesTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        let mut line = message.to_json()?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.sent += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        self.writer.flush().await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// forward_chunks
// ---------------------------------------------------------------------------

/// Forward every chunk from `rx` until all senders are dropped, then send
/// the stop marker when `send_stop` is set.
///
/// Returns the number of audio chunks forwarded.  On failure the error is
/// logged and `rx` is dropped, so further `send`s on the channel fail.
pub async fn forward_chunks<T>(
    rx: mpsc::UnboundedReceiver<String>,
    transport: &mut T,
    send_stop: bool,
) -> Result<u64, TransportError>
where
    T: ChunkTransport + ?Sized,
{
    let result = drain(rx, transport, send_stop).await;
    match &result {
        Ok(forwarded) => log::info!("transport: chunk channel closed, {forwarded} chunks sent"),
        Err(e) => log::error!("transport: forwarding stopped: {e}"),
    }
    result
}

async fn drain<T>(
    mut rx: mpsc::UnboundedReceiver<String>,
    transport: &mut T,
    send_stop: bool,
) -> Result<u64, TransportError>
where
    T: ChunkTransport + ?Sized,
{
    let mut forwarded = 0u64;

    while let Some(chunk) = rx.recv().await {
        transport.send(&ClientMessage::audio(chunk)).await?;
        forwarded += 1;
        if forwarded <= 5 {
            log::debug!("transport: forwarded chunk #{forwarded}");
        }
    }

    if send_stop {
        transport.send(&ClientMessage::stop()).await?;
    }
    transport.flush().await?;
    Ok(forwarded)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
