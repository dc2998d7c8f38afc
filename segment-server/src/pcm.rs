use crate::query::SampleType;

/// Reshapes an interleaved little-endian PCM byte buffer to `(frames,
/// channels)`, averages across the channel axis, and scales integer sample
/// types into `[-1, 1]`. A direct port of the upstream PyTorch
/// reshape/transpose/mean pipeline expressed as iterator arithmetic.
pub fn normalize(data: &[u8], channels: u32, sample_type: SampleType) -> Vec<f32> {
    let channels = channels as usize;
    let bytes_per_sample = sample_type.bytes_per_sample();
    let frame_bytes = bytes_per_sample * channels;
    let frame_count = data.len() / frame_bytes;

    let mut mono = Vec::with_capacity(frame_count);
    for frame in data.chunks_exact(frame_bytes) {
        let mut sum = 0.0f32;
        for sample_bytes in frame.chunks_exact(bytes_per_sample) {
            sum += decode_sample(sample_bytes, sample_type);
        }
        mono.push(sum / channels as f32);
    }
    mono
}

fn decode_sample(bytes: &[u8], sample_type: SampleType) -> f32 {
    match sample_type {
        SampleType::I16 => {
            let raw = i16::from_le_bytes([bytes[0], bytes[1]]);
            raw as f32 / i16::MAX as f32
        }
        SampleType::I32 => {
            let raw = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            raw as f32 / i32::MAX as f32
        }
        SampleType::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i16_mono_round_trips_to_unit_range() {
        let samples: [i16; 3] = [0, i16::MAX, i16::MIN + 1];
        let mut bytes = Vec::new();
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        let mono = normalize(&bytes, 1, SampleType::I16);
        assert_eq!(mono.len(), 3);
        assert!((mono[0] - 0.0).abs() < 1e-6);
        assert!((mono[1] - 1.0).abs() < 1e-6);
        assert!((mono[2] - (-1.0)).abs() < 1e-4);
    }

    #[test]
    fn stereo_i16_averages_channels() {
        let left = 1000i16;
        let right = 2000i16;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&left.to_le_bytes());
        bytes.extend_from_slice(&right.to_le_bytes());
        let mono = normalize(&bytes, 2, SampleType::I16);
        assert_eq!(mono.len(), 1);
        let expected = (left as f32 + right as f32) / 2.0 / i16::MAX as f32;
        assert!((mono[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn f32_passthrough_is_unscaled() {
        let samples: [f32; 2] = [0.25, -0.5];
        let mut bytes = Vec::new();
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        let mono = normalize(&bytes, 1, SampleType::F32);
        assert_eq!(mono, vec![0.25, -0.5]);
    }

    #[test]
    fn trailing_partial_frame_is_dropped() {
        let mut bytes = 4i16.to_le_bytes().to_vec();
        bytes.push(0); // one stray byte, not enough for another i16 sample
        let mono = normalize(&bytes, 1, SampleType::I16);
        assert_eq!(mono.len(), 1);
    }
}
