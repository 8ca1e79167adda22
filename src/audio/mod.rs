//! Audio primitives — circular capture, resampling and PCM16 encoding.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → stereo_to_mono → CaptureClip (circular)
//!           → read_window → resample_linear → encode_pcm16
//! ```
//!
//! Everything except [`CpalCapture`] is a pure function or plain data, so the
//! streaming driver in [`crate::stream`] can be tested with a scripted device.
//!
//! # Quick Start
//!
//! ```rust
//! use mic_streamer::audio::{encode_pcm16, read_window, resample_linear};
//!
//! let clip: Vec<f32> = vec![0.25; 48_000];
//! let window = read_window(&clip, 47_000, 3072).unwrap(); // wraps
//! let mono_16k = resample_linear(&window, 48_000, 16_000);
//! let bytes = encode_pcm16(&mono_16k);
//! assert_eq!(bytes.len(), 2048);
//! ```

pub mod capture;
pub mod pcm;
pub mod resample;
pub mod ring;

pub use capture::{input_device_names, CaptureDevice, CaptureError, CpalCapture};
pub use pcm::{decode_pcm16, encode_pcm16};
pub use resample::{input_chunk_len, resample_linear, stereo_to_mono};
pub use ring::{read_circular, read_window, CaptureClip, WindowError};

#[cfg(test)]
pub use capture::MockDevice;
