//! Microphone capture and PCM16 chunk streaming for a speech-to-text backend.
//!
//! * [`audio`] — circular capture clip, window reads, resampling, PCM16.
//! * [`stream`] — the tick-driven [`stream::MicStreamer`] state machine.
//! * [`protocol`] — JSON messages exchanged with the STT server.
//! * [`transport`] — async forwarding of emitted chunks.
//! * [`config`] — `settings.toml` persistence.

pub mod audio;
pub mod config;
pub mod protocol;
pub mod stream;
pub mod transport;
