//! Circular capture clip and wrap-aware window reads.
//!
//! The capture device writes mono samples into a [`CaptureClip`] of fixed
//! length, wrapping its write cursor back to index 0 when it reaches the end.
//! The streaming driver keeps its own read cursor and pulls fixed-size
//! windows out of the clip with [`read_window`].
//!
//! # Example
//!
//! ```rust
//! use mic_streamer::audio::read_window;
//!
//! let clip = [0.0_f32, 1.0, 2.0, 3.0, 4.0];
//! // Starts at index 3, wraps after index 4.
//! let window = read_window(&clip, 3, 4).unwrap();
//! assert_eq!(window, vec![3.0, 4.0, 0.0, 1.0]);
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// WindowError
// ---------------------------------------------------------------------------

/// An invalid window request against a circular buffer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// More samples were requested than the buffer holds.
    #[error("window of {requested} samples exceeds buffer length {buffer_len}")]
    TooLong { requested: usize, buffer_len: usize },

    /// The start index lies outside the buffer.
    #[error("window start {start} is out of range for buffer length {buffer_len}")]
    StartOutOfRange { start: usize, buffer_len: usize },
}

// ---------------------------------------------------------------------------
// read_circular / read_window
// ---------------------------------------------------------------------------

/// Fill `out` with `out.len()` samples of `buffer`, starting at `start` and
/// wrapping to index 0 past the end.
///
/// The tail segment `[start, len)` always precedes the head segment, so the
/// output is in capture order.  The caller advances its own cursor by
/// `out.len()` modulo the buffer length.
///
/// # Errors
///
/// [`WindowError::TooLong`] when `out` is longer than `buffer`, and
/// [`WindowError::StartOutOfRange`] when `start >= buffer.len()`.
pub fn read_circular(buffer: &[f32], start: usize, out: &mut [f32]) -> Result<(), WindowError> {
    let len = buffer.len();
    let n = out.len();

    if n > len {
        return Err(WindowError::TooLong {
            requested: n,
            buffer_len: len,
        });
    }
    if n == 0 {
        return Ok(());
    }
    if start >= len {
        return Err(WindowError::StartOutOfRange {
            start,
            buffer_len: len,
        });
    }

    let tail = len - start;
    if n <= tail {
        out.copy_from_slice(&buffer[start..start + n]);
    } else {
        let (first, second) = out.split_at_mut(tail);
        first.copy_from_slice(&buffer[start..]);
        second.copy_from_slice(&buffer[..n - tail]);
    }
    Ok(())
}

/// Allocating variant of [`read_circular`].
pub fn read_window(buffer: &[f32], start: usize, n: usize) -> Result<Vec<f32>, WindowError> {
    let mut out = vec![0.0_f32; n];
    read_circular(buffer, start, &mut out)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// CaptureClip
// ---------------------------------------------------------------------------

/// Fixed-length circular sample store written by the capture device.
///
/// Unlike a queue, nothing is ever consumed: the writer overwrites the oldest
/// samples once it laps the clip, and readers address the clip by absolute
/// index.  [`position`](Self::position) mirrors a hardware write cursor and
/// stays at 0 until the first sample lands.
pub struct CaptureClip {
    samples: Vec<f32>,
    /// Index of the *next* write position (wraps around the clip length).
    write_pos: usize,
    /// Total samples ever written; used to tell "not started" from "wrapped".
    written: u64,
}

impl CaptureClip {
    /// Create a silent clip holding `len` samples.
    ///
    /// # Panics
    ///
    /// Panics if `len == 0`.
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "CaptureClip length must be > 0");
        Self {
            samples: vec![0.0; len],
            write_pos: 0,
            written: 0,
        }
    }

    /// Clip length needed for `secs` seconds at `sample_rate` Hz (at least 1).
    pub fn len_for(secs: u32, sample_rate: u32) -> usize {
        (secs as usize * sample_rate as usize).max(1)
    }

    /// Write `data` at the cursor, overwriting the oldest samples on wrap.
    pub fn write(&mut self, data: &[f32]) {
        let len = self.samples.len();
        let mut rest = data;
        // Only the newest `len` samples can survive a single write.
        if rest.len() > len {
            let skip = rest.len() - len;
            self.write_pos = (self.write_pos + skip) % len;
            self.written += skip as u64;
            rest = &rest[skip..];
        }

        while !rest.is_empty() {
            let room = len - self.write_pos;
            let take = room.min(rest.len());
            self.samples[self.write_pos..self.write_pos + take].copy_from_slice(&rest[..take]);
            self.write_pos = (self.write_pos + take) % len;
            self.written += take as u64;
            rest = &rest[take..];
        }
    }

    /// Current write cursor in `[0, len)`.
    pub fn position(&self) -> usize {
        self.write_pos
    }

    /// Total number of samples written since creation.
    pub fn total_written(&self) -> u64 {
        self.written
    }

    /// Clip length in samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; a clip is never zero-length.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw view of the circular storage.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Read `n` samples starting at `start`, wrapping as needed.
    pub fn read_window(&self, start: usize, n: usize) -> Result<Vec<f32>, WindowError> {
        read_window(&self.samples, start, n)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32).collect()
    }

    // ---- read_window -------------------------------------------------------

    #[test]
    fn contiguous_read() {
        let buf = ramp(8);
        assert_eq!(read_window(&buf, 2, 3).unwrap(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn read_ending_exactly_at_buffer_end_does_not_wrap() {
        let buf = ramp(8);
        assert_eq!(read_window(&buf, 5, 3).unwrap(), vec![5.0, 6.0, 7.0]);
    }

    #[test]
    fn wrapped_read_is_tail_then_head() {
        let buf = ramp(8);
        assert_eq!(
            read_window(&buf, 6, 5).unwrap(),
            vec![6.0, 7.0, 0.0, 1.0, 2.0]
        );
    }

    #[test]
    fn every_start_and_length_preserves_order() {
        let len = 13;
        let buf = ramp(len);
        for s in 0..len {
            for n in 1..=len {
                let got = read_window(&buf, s, n).unwrap();
                let expected: Vec<f32> = (0..n).map(|k| ((s + k) % len) as f32).collect();
                assert_eq!(got, expected, "start={s} n={n}");
            }
        }
    }

    #[test]
    fn full_length_read_from_middle() {
        let buf = ramp(4);
        assert_eq!(read_window(&buf, 2, 4).unwrap(), vec![2.0, 3.0, 0.0, 1.0]);
    }

    #[test]
    fn too_long_request_is_rejected() {
        let buf = ramp(4);
        assert_eq!(
            read_window(&buf, 0, 5),
            Err(WindowError::TooLong {
                requested: 5,
                buffer_len: 4
            })
        );
    }

    #[test]
    fn start_out_of_range_is_rejected() {
        let buf = ramp(4);
        assert_eq!(
            read_window(&buf, 4, 1),
            Err(WindowError::StartOutOfRange {
                start: 4,
                buffer_len: 4
            })
        );
    }

    #[test]
    fn zero_length_read_is_empty() {
        let buf = ramp(4);
        assert!(read_window(&buf, 1, 0).unwrap().is_empty());
    }

    // ---- CaptureClip -------------------------------------------------------

    #[test]
    fn fresh_clip_is_silent_at_position_zero() {
        let clip = CaptureClip::new(4);
        assert_eq!(clip.position(), 0);
        assert_eq!(clip.total_written(), 0);
        assert_eq!(clip.samples(), &[0.0; 4]);
    }

    #[test]
    fn write_advances_position() {
        let mut clip = CaptureClip::new(8);
        clip.write(&[1.0, 2.0, 3.0]);
        assert_eq!(clip.position(), 3);
        assert_eq!(&clip.samples()[..3], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn write_wraps_and_overwrites_oldest() {
        let mut clip = CaptureClip::new(4);
        clip.write(&[1.0, 2.0, 3.0]);
        clip.write(&[4.0, 5.0, 6.0]);
        assert_eq!(clip.position(), 2);
        assert_eq!(clip.samples(), &[5.0, 6.0, 3.0, 4.0]);
        assert_eq!(clip.total_written(), 6);
    }

    #[test]
    fn oversized_write_keeps_newest_samples() {
        let mut clip = CaptureClip::new(3);
        clip.write(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(clip.position(), 2);
        // Reading the whole clip from the write cursor yields capture order.
        assert_eq!(clip.read_window(2, 3).unwrap(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn len_for_seconds() {
        assert_eq!(CaptureClip::len_for(5, 16_000), 80_000);
        assert_eq!(CaptureClip::len_for(0, 16_000), 1);
    }

    #[test]
    #[should_panic(expected = "CaptureClip length must be > 0")]
    fn zero_length_panics() {
        let _clip = CaptureClip::new(0);
    }
}
