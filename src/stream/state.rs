//! Streaming state machine and per-tick outcomes.

/// States of the microphone streamer.
///
/// ```text
/// Idle ──start()──▶ Starting ──position > 0──▶ Streaming
///                      │                           │
///                      └──timeout──▶ Idle ◀──stop()┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// No capture device is open.
    #[default]
    Idle,

    /// The device was started; waiting for its write cursor to move.
    Starting,

    /// Windows are being read, resampled, encoded and emitted each tick.
    Streaming,
}

impl StreamState {
    /// `true` while the capture device is held open.
    ///
    /// ```
    /// use mic_streamer::stream::StreamState;
    ///
    /// assert!(!StreamState::Idle.is_active());
    /// assert!(StreamState::Starting.is_active());
    /// assert!(StreamState::Streaming.is_active());
    /// ```
    pub fn is_active(&self) -> bool {
        !matches!(self, StreamState::Idle)
    }

    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            StreamState::Idle => "Idle",
            StreamState::Starting => "Starting",
            StreamState::Streaming => "Streaming",
        }
    }
}

/// What a single call to [`MicStreamer::tick`](super::MicStreamer::tick) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not started; nothing to do.
    Idle,
    /// Still waiting for the device to produce its first samples.
    Waiting,
    /// The device just became ready; a session was created this tick.
    Ready,
    /// Streaming, but less than one input window is available.
    Pending,
    /// Exactly one chunk was handed to the consumer.
    Emitted,
}
