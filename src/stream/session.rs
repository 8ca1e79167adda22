//! Per-recording geometry and read cursor.

use crate::audio::input_chunk_len;

use super::StreamError;

/// One active recording: rates, chunk sizes and the read cursor into the
/// device's circular clip.
///
/// Invariants: `cursor < buffer_len` and `1 <= input_chunk <= buffer_len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSession {
    input_rate: u32,
    output_rate: u32,
    input_chunk: usize,
    output_chunk: usize,
    cursor: usize,
    buffer_len: usize,
}

impl CaptureSession {
    /// Build a session for a device running at `input_rate` with a clip of
    /// `buffer_len` samples, reading from `cursor` onwards.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidSampleRate`] when either rate is 0, and
    /// [`StreamError::ChunkExceedsBuffer`] when one input window would not
    /// fit in the clip.
    pub fn new(
        input_rate: u32,
        output_rate: u32,
        output_chunk: usize,
        buffer_len: usize,
        cursor: usize,
    ) -> Result<Self, StreamError> {
        if input_rate == 0 || output_rate == 0 {
            return Err(StreamError::InvalidSampleRate {
                input_rate,
                output_rate,
            });
        }

        let input_chunk = input_chunk_len(output_chunk, input_rate, output_rate);
        if input_chunk > buffer_len {
            return Err(StreamError::ChunkExceedsBuffer {
                chunk: input_chunk,
                buffer_len,
            });
        }

        Ok(Self {
            input_rate,
            output_rate,
            input_chunk,
            output_chunk,
            cursor: cursor % buffer_len,
            buffer_len,
        })
    }

    /// Samples written since the cursor, given the device write position.
    ///
    /// A write position behind the cursor means the writer wrapped.
    pub fn available(&self, write_pos: usize) -> usize {
        if write_pos >= self.cursor {
            write_pos - self.cursor
        } else {
            write_pos + self.buffer_len - self.cursor
        }
    }

    /// `true` when at least one full input window is waiting.
    pub fn has_window(&self, write_pos: usize) -> bool {
        self.available(write_pos) >= self.input_chunk
    }

    /// Move the cursor past one input window.
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + self.input_chunk) % self.buffer_len;
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    pub fn input_chunk(&self) -> usize {
        self.input_chunk
    }

    pub fn output_chunk(&self) -> usize {
        self.output_chunk
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }
}
