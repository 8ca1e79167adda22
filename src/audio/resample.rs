//! Sample-rate conversion and channel mixing.
//!
//! The STT backend expects **16 kHz mono** audio while capture hardware
//! usually runs at 44.1 or 48 kHz with one or two channels.  This module
//! provides the conversion steps:
//!
//! 1. [`stereo_to_mono`] — downmix interleaved channels in the device callback.
//! 2. [`resample_linear`] — convert one window from the device rate to the
//!    output rate.
//! 3. [`input_chunk_len`] — size an input window so it resamples to a fixed
//!    number of output samples.
//!
//! ## Known limitation
//!
//! The resampler is plain linear interpolation with no low-pass filter in
//! front of it, so downsampling aliases content above the output Nyquist
//! frequency into the speech band.  This is tolerated for transcription and
//! kept for compatibility with the existing backend.

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`.
///
/// * If `channels == 1` the input is copied unchanged.
/// * If `channels == 0` an empty vector is returned.
///
/// # Example
///
/// ```rust
/// use mic_streamer::audio::stereo_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// let mono = stereo_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// input_chunk_len
// ---------------------------------------------------------------------------

/// Number of input samples at `in_rate` covering the same duration as
/// `output_chunk` samples at `out_rate`, rounded, never below 1.
///
/// ```rust
/// use mic_streamer::audio::input_chunk_len;
///
/// assert_eq!(input_chunk_len(1024, 16_000, 16_000), 1024);
/// assert_eq!(input_chunk_len(1024, 48_000, 16_000), 3072);
/// ```
pub fn input_chunk_len(output_chunk: usize, in_rate: u32, out_rate: u32) -> usize {
    if out_rate == 0 {
        return 1;
    }
    let len = (output_chunk as f64 * in_rate as f64 / out_rate as f64).round() as usize;
    len.max(1)
}

// ---------------------------------------------------------------------------
// resample_linear
// ---------------------------------------------------------------------------

/// Resample `samples` from `in_rate` Hz to `out_rate` Hz by linear
/// interpolation.
///
/// * Equal rates return an exact copy; no interpolation is performed.
/// * Empty input returns an empty vector.
/// * The output holds `round(samples.len() / ratio)` samples where
///   `ratio = in_rate / out_rate`.
///
/// Source indices are clamped to the last input sample, so short inputs and
/// upsampling never read out of bounds.
///
/// # Example
///
/// ```rust
/// use mic_streamer::audio::resample_linear;
///
/// let hi = vec![0.5_f32; 3072];
/// let lo = resample_linear(&hi, 48_000, 16_000);
/// assert_eq!(lo.len(), 1024);
/// ```
pub fn resample_linear(samples: &[f32], in_rate: u32, out_rate: u32) -> Vec<f32> {
    if in_rate == out_rate {
        return samples.to_vec();
    }

    if samples.is_empty() || in_rate == 0 || out_rate == 0 {
        return Vec::new();
    }

    let ratio = in_rate as f64 / out_rate as f64;
    let output_len = (samples.len() as f64 / ratio).round() as usize;
    let last = samples.len() - 1;
    let mut output = Vec::with_capacity(output_len);

    for o in 0..output_len {
        let pos = o as f64 * ratio;
        let i0 = (pos.floor() as usize).min(last);
        let i1 = (i0 + 1).min(last);
        let frac = (pos - i0 as f64).clamp(0.0, 1.0) as f32;

        let a = samples[i0];
        let b = samples[i1];
        output.push(a + (b - a) * frac);
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- stereo_to_mono ----------------------------------------------------

    #[test]
    fn stereo_to_mono_already_mono() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(stereo_to_mono(&input, 1), input);
    }

    #[test]
    fn stereo_to_mono_two_channel() {
        let input = vec![1.0_f32, -1.0, 0.5, 0.5];
        let out = stereo_to_mono(&input, 2);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn stereo_to_mono_drops_partial_frame() {
        let out = stereo_to_mono(&[0.2_f32, 0.4, 0.6], 2);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn stereo_to_mono_zero_channels() {
        assert!(stereo_to_mono(&[1.0_f32, 2.0], 0).is_empty());
    }

    // ---- input_chunk_len ---------------------------------------------------

    #[test]
    fn input_chunk_for_common_rates() {
        assert_eq!(input_chunk_len(1024, 16_000, 16_000), 1024);
        assert_eq!(input_chunk_len(1024, 48_000, 16_000), 3072);
        assert_eq!(input_chunk_len(1024, 44_100, 16_000), 2822);
        assert_eq!(input_chunk_len(1024, 8_000, 16_000), 512);
    }

    #[test]
    fn input_chunk_never_below_one() {
        assert_eq!(input_chunk_len(1, 1_000, 16_000), 1);
        assert_eq!(input_chunk_len(0, 48_000, 16_000), 1);
    }

    // ---- resample_linear ---------------------------------------------------

    #[test]
    fn equal_rates_are_identity() {
        let input: Vec<f32> = (0..160).map(|i| (i as f32 * 0.37).sin()).collect();
        let out = resample_linear(&input, 16_000, 16_000);
        assert_eq!(out, input);
    }

    #[test]
    fn empty_input() {
        assert!(resample_linear(&[], 48_000, 16_000).is_empty());
    }

    #[test]
    fn output_length_is_rounded_ratio() {
        assert_eq!(resample_linear(&vec![0.0; 3072], 48_000, 16_000).len(), 1024);
        assert_eq!(resample_linear(&vec![0.0; 441], 44_100, 16_000).len(), 160);
        assert_eq!(resample_linear(&vec![0.0; 100], 22_050, 16_000).len(), 73);
        assert_eq!(resample_linear(&vec![0.0; 80], 8_000, 16_000).len(), 160);
    }

    #[test]
    fn single_sample_input_stays_in_bounds() {
        let out = resample_linear(&[0.25], 8_000, 16_000);
        assert_eq!(out, vec![0.25, 0.25]);

        let out = resample_linear(&[0.25], 48_000, 16_000);
        assert!(out.is_empty()); // round(1 / 3) == 0
        let out = resample_linear(&[0.25], 24_000, 16_000);
        assert_eq!(out, vec![0.25]); // round(1 / 1.5) == 1
    }

    #[test]
    fn downsample_by_three_picks_every_third_sample() {
        let input: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let out = resample_linear(&input, 48_000, 16_000);
        assert_eq!(out, vec![0.0, 3.0, 6.0, 9.0]);
    }

    #[test]
    fn upsample_interpolates_midpoints() {
        let out = resample_linear(&[0.0, 1.0, 0.0], 8_000, 16_000);
        assert_eq!(out.len(), 6);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!((out[2] - 1.0).abs() < 1e-6);
        assert!((out[3] - 0.5).abs() < 1e-6);
        // Past the last input sample the value holds.
        assert!((out[5] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn constant_signal_preserves_amplitude() {
        let out = resample_linear(&vec![0.5_f32; 2822], 44_100, 16_000);
        for &s in &out {
            assert!((s - 0.5).abs() < 1e-6, "amplitude drift: {s}");
        }
    }
}
