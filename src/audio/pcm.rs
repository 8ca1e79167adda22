//! Float ↔ PCM16 little-endian conversion.
//!
//! Positive samples scale by `32767` and negative samples by `32768`, so the
//! full `[-1.0, 1.0]` range maps onto the full `i16` range without overflow.
//! Anything outside that range is clamped, never wrapped.

/// Bytes per encoded PCM16 sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Convert one float sample to a clamped `i16`.
///
/// NaN encodes as silence.
pub fn sample_to_i16(sample: f32) -> i16 {
    let scaled = if sample < 0.0 {
        sample * 32_768.0
    } else {
        sample * 32_767.0
    };
    // `as` saturates and maps NaN to 0.
    scaled.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Encode `samples` as little-endian signed 16-bit PCM.
///
/// The output is exactly `2 * samples.len()` bytes, low byte first.
/// Negative samples scale by 32768, not 32767 (-0.9 encodes to -29491), so
/// decoders must use the same asymmetric scale, as [`decode_pcm16`] does.
///
/// ```rust
/// use mic_streamer::audio::encode_pcm16;
///
/// assert_eq!(encode_pcm16(&[1.0, -1.0]), vec![0xFF, 0x7F, 0x00, 0x80]);
/// ```
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for &s in samples {
        out.extend_from_slice(&sample_to_i16(s).to_le_bytes());
    }
    out
}

/// Decode little-endian PCM16 bytes back to floats in `[-1.0, 1.0]`.
///
/// A trailing odd byte is ignored.
pub fn decode_pcm16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| {
            let v = i16::from_le_bytes([pair[0], pair[1]]);
            if v < 0 {
                v as f32 / 32_768.0
            } else {
                v as f32 / 32_767.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_i16(bytes: &[u8]) -> Vec<i16> {
        bytes
            .chunks_exact(2)
            .map(|p| i16::from_le_bytes([p[0], p[1]]))
            .collect()
    }

    #[test]
    fn full_scale_maps_to_i16_extremes() {
        let encoded = encode_pcm16(&[1.0, -1.0, 0.0]);
        assert_eq!(as_i16(&encoded), vec![32_767, -32_768, 0]);
    }

    #[test]
    fn negative_samples_use_the_wider_scale() {
        assert_eq!(as_i16(&encode_pcm16(&[-0.9, 0.9, -0.5])), vec![-29_491, 29_490, -16_384]);
    }

    #[test]
    fn out_of_range_is_clamped_not_wrapped() {
        let encoded = encode_pcm16(&[1.5, -1.5, 100.0, -100.0]);
        assert_eq!(as_i16(&encoded), vec![32_767, -32_768, 32_767, -32_768]);
    }

    #[test]
    fn round_trip_within_one_step() {
        let input = [0.0_f32, 0.5, -0.5, 1.0, -1.0];
        let decoded = decode_pcm16(&encode_pcm16(&input));
        assert_eq!(decoded.len(), input.len());
        for (a, b) in input.iter().zip(decoded.iter()) {
            assert!((a - b).abs() <= 1.0 / 32_767.0, "{a} vs {b}");
        }
    }

    #[test]
    fn little_endian_byte_order() {
        // 0.5 * 32767 = 16383.5 → 16384 = 0x4000
        assert_eq!(encode_pcm16(&[0.5]), vec![0x00, 0x40]);
        // -0.5 * 32768 = -16384 = 0xC000
        assert_eq!(encode_pcm16(&[-0.5]), vec![0x00, 0xC0]);
    }

    #[test]
    fn output_is_twice_input_length() {
        assert_eq!(encode_pcm16(&vec![0.1; 1024]).len(), 2048);
        assert!(encode_pcm16(&[]).is_empty());
    }

    #[test]
    fn nan_encodes_as_silence() {
        assert_eq!(sample_to_i16(f32::NAN), 0);
    }

    #[test]
    fn decode_ignores_trailing_odd_byte() {
        assert_eq!(decode_pcm16(&[0xFF, 0x7F, 0x01]), vec![1.0]);
    }
}
