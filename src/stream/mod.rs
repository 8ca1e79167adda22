//! Streaming driver — turns a capture device into base64 PCM16 chunks.
//!
//! # Architecture
//!
//! ```text
//! host loop ──tick()──▶ MicStreamer
//!                          │
//!                          ├─ Starting:  wait for device position > 0
//!                          │             (abort after startup timeout)
//!                          │
//!                          └─ Streaming: CaptureSession cursor
//!                                        → read_window → resample → encode
//!                                        → ChunkEmitter → on_chunk callback
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::mpsc;
//! use mic_streamer::audio::CpalCapture;
//! use mic_streamer::config::StreamConfig;
//! use mic_streamer::stream::MicStreamer;
//!
//! let (tx, rx) = mpsc::channel::<String>();
//! let mut streamer = MicStreamer::new(CpalCapture::new(None), StreamConfig::default());
//! streamer.on_chunk(move |chunk| {
//!     let _ = tx.send(chunk);
//! });
//! streamer.start().unwrap();
//! // call streamer.tick() once per frame; drain rx on the transport side
//! ```

pub mod emitter;
pub mod session;
pub mod state;
pub mod streamer;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use emitter::{encode_transport, ChunkCallback, ChunkEmitter};
pub use session::CaptureSession;
pub use state::{StreamState, TickOutcome};
pub use streamer::{MicStreamer, StreamError};
