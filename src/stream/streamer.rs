//! Tick-driven microphone streamer.
//!
//! [`MicStreamer`] owns a [`CaptureDevice`] and turns its circular clip into
//! a sequence of base64 PCM16 chunks at the output rate.  It never spawns
//! threads and never blocks: the host calls [`tick`](MicStreamer::tick) once
//! per loop iteration and at most one chunk is produced per call.
//!
//! # Tick flow
//!
//! ```text
//! Starting  └─▶ samples captured ? → build CaptureSession (cursor = position) → Ready
//!               elapsed > timeout → release device → Err(NotReady)
//!
//! Streaming └─▶ available < input_chunk → Pending
//!               read_window → advance cursor → resample_linear
//!               → encode_pcm16 → base64 → callback            → Emitted
//! ```

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::audio::{encode_pcm16, resample_linear, CaptureDevice, CaptureError, WindowError};
use crate::config::StreamConfig;

use super::emitter::ChunkEmitter;
use super::session::CaptureSession;
use super::state::{StreamState, TickOutcome};

// ---------------------------------------------------------------------------
// StreamError
// ---------------------------------------------------------------------------

/// Recoverable streaming failures.  Each leaves the streamer in `Idle`.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The capture device could not be opened.
    #[error("capture device unavailable: {0}")]
    Capture(#[from] CaptureError),

    /// The device never produced samples within the startup timeout.
    #[error("microphone did not start within {timeout_ms} ms")]
    NotReady { timeout_ms: u64 },

    /// A device or configuration reported a zero sample rate.
    #[error("invalid sample rate (input {input_rate} Hz, output {output_rate} Hz)")]
    InvalidSampleRate { input_rate: u32, output_rate: u32 },

    /// One input window does not fit in the capture clip.
    #[error("input chunk of {chunk} samples exceeds capture buffer of {buffer_len} samples")]
    ChunkExceedsBuffer { chunk: usize, buffer_len: usize },

    /// A window read was rejected by the ring buffer.
    #[error("window read failed: {0}")]
    Window(#[from] WindowError),
}

// ---------------------------------------------------------------------------
// MicStreamer
// ---------------------------------------------------------------------------

/// Drives capture → resample → encode → emit, one chunk per tick.
///
/// # Example
///
/// ```rust,no_run
/// use mic_streamer::audio::CpalCapture;
/// use mic_streamer::config::StreamConfig;
/// use mic_streamer::stream::MicStreamer;
///
/// let mut streamer = MicStreamer::new(CpalCapture::new(None), StreamConfig::default());
/// streamer.on_chunk(|b64| println!("{{\"audio\":\"{b64}\"}}"));
/// streamer.start().unwrap();
/// loop {
///     if let Err(e) = streamer.tick() {
///         eprintln!("{e}");
///         break;
///     }
///     std::thread::sleep(std::time::Duration::from_millis(16));
/// }
/// ```
pub struct MicStreamer<D: CaptureDevice> {
    device: D,
    config: StreamConfig,
    state: StreamState,
    session: Option<CaptureSession>,
    started_at: Option<Instant>,
    last_position_log: Option<Instant>,
    emitter: ChunkEmitter,
}

impl<D: CaptureDevice> MicStreamer<D> {
    /// Create an idle streamer around `device`.
    pub fn new(device: D, config: StreamConfig) -> Self {
        Self {
            device,
            config,
            state: StreamState::Idle,
            session: None,
            started_at: None,
            last_position_log: None,
            emitter: ChunkEmitter::new(),
        }
    }

    /// Register the single chunk consumer, replacing any previous one.
    ///
    /// The callback receives base64 text of little-endian PCM16 samples at
    /// the output rate and runs on the ticking thread.
    pub fn on_chunk<F>(&mut self, callback: F)
    where
        F: FnMut(String) + 'static,
    {
        self.emitter.set_callback(Box::new(callback));
    }

    // -----------------------------------------------------------------------
    // Start / stop
    // -----------------------------------------------------------------------

    /// Open the capture device and enter `Starting`.
    ///
    /// Calling this while already started is a no-op.
    ///
    /// # Errors
    ///
    /// [`StreamError::Capture`] when the device cannot be opened; the
    /// streamer stays `Idle`.
    pub fn start(&mut self) -> Result<(), StreamError> {
        self.start_at(Instant::now())
    }

    /// [`start`](Self::start) with an explicit clock reading.
    pub fn start_at(&mut self, now: Instant) -> Result<(), StreamError> {
        if self.state.is_active() {
            log::debug!("stream: start ignored in state {}", self.state.label());
            return Ok(());
        }

        if let Err(e) = self
            .device
            .start(self.config.buffer_secs, self.config.output_sample_rate)
        {
            log::error!("stream: cannot open microphone: {e}");
            return Err(e.into());
        }

        self.emitter.reset_count();
        self.started_at = Some(now);
        self.last_position_log = None;
        self.state = StreamState::Starting;
        log::debug!("stream: Idle → Starting");
        Ok(())
    }

    /// Release the device and return to `Idle`.  No chunk is emitted after
    /// this returns; partially captured audio is discarded.
    pub fn stop(&mut self) {
        if !self.state.is_active() {
            return;
        }
        self.release();
        log::info!(
            "stream: stopped after {} chunks",
            self.emitter.emitted()
        );
    }

    fn release(&mut self) {
        self.device.stop();
        self.session = None;
        self.started_at = None;
        self.state = StreamState::Idle;
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the state machine once using the current time.
    pub fn tick(&mut self) -> Result<TickOutcome, StreamError> {
        self.tick_at(Instant::now())
    }

    /// Advance the state machine once.
    ///
    /// # Errors
    ///
    /// Every error aborts the recording and leaves the streamer `Idle`:
    /// [`StreamError::NotReady`] on startup timeout, or a session/window
    /// error when the device geometry is unusable.
    pub fn tick_at(&mut self, now: Instant) -> Result<TickOutcome, StreamError> {
        match self.state {
            StreamState::Idle => Ok(TickOutcome::Idle),
            StreamState::Starting => self.poll_ready(now),
            StreamState::Streaming => self.pump(now),
        }
    }

    fn poll_ready(&mut self, now: Instant) -> Result<TickOutcome, StreamError> {
        if self.device.samples_captured() == 0 {
            let elapsed = self
                .started_at
                .map_or(Duration::ZERO, |t| now.saturating_duration_since(t));
            if elapsed > self.config.startup_timeout() {
                log::warn!(
                    "stream: microphone did not start within {} ms",
                    self.config.startup_timeout_ms
                );
                self.release();
                return Err(StreamError::NotReady {
                    timeout_ms: self.config.startup_timeout_ms,
                });
            }
            return Ok(TickOutcome::Waiting);
        }

        let position = self.device.position();
        let session = match CaptureSession::new(
            self.device.sample_rate(),
            self.config.output_sample_rate,
            self.config.output_chunk_samples,
            self.device.buffer_len(),
            position,
        ) {
            Ok(session) => session,
            Err(e) => {
                log::error!("stream: cannot build session: {e}");
                self.release();
                return Err(e);
            }
        };

        log::info!(
            "stream: ready, real={} Hz, out={} Hz, clip={} samples, chunk_in={}",
            session.input_rate(),
            session.output_rate(),
            session.buffer_len(),
            session.input_chunk()
        );

        self.session = Some(session);
        self.state = StreamState::Streaming;
        Ok(TickOutcome::Ready)
    }

    fn pump(&mut self, now: Instant) -> Result<TickOutcome, StreamError> {
        let position = self.device.position();
        self.log_position(now, position);

        let session = match self.session.as_mut() {
            Some(session) => session,
            // Streaming always carries a session.
            None => {
                self.release();
                return Ok(TickOutcome::Idle);
            }
        };

        if !session.has_window(position) {
            return Ok(TickOutcome::Pending);
        }

        debug_assert!(
            session.input_chunk() <= self.device.buffer_len(),
            "input chunk larger than capture clip"
        );

        let window = match self
            .device
            .read_window(session.cursor(), session.input_chunk())
        {
            Ok(window) => window,
            Err(e) => {
                log::error!("stream: {e}");
                self.release();
                return Err(e.into());
            }
        };
        session.advance();

        let resampled = resample_linear(&window, session.input_rate(), session.output_rate());
        let pcm = encode_pcm16(&resampled);
        self.emitter.emit(&pcm);

        Ok(TickOutcome::Emitted)
    }

    fn log_position(&mut self, now: Instant, position: usize) {
        if !self.config.verbose_logs {
            return;
        }
        let due = self.last_position_log.map_or(true, |t| {
            now.saturating_duration_since(t) >= self.config.position_log_interval()
        });
        if due {
            self.last_position_log = Some(now);
            log::debug!(
                "stream: mic position {}/{}",
                position,
                self.device.buffer_len()
            );
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The active session, present only while `Streaming`.
    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Chunks emitted since the last `start`.
    pub fn chunks_emitted(&self) -> u64 {
        self.emitter.emitted()
    }
}

impl<D: CaptureDevice> Drop for MicStreamer<D> {
    fn drop(&mut self) {
        if self.state.is_active() {
            self.release();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
