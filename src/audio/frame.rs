/// Raw audio delivered by a capture source.
///
/// Samples are normalized floats as captured; quantization to 16-bit PCM
/// happens in the chunk pipeline, not at the source.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Normalized amplitude samples, interleaved
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Quantize normalized float samples to 16-bit signed PCM.
///
/// A gain multiplier is applied first (improves voiced/silence separation),
/// then each sample is clamped to [-1, 1] before scaling so boosted samples
/// cannot overflow.
pub fn quantize(samples: &[f32], gain: f32) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| {
            let amplified = (s * gain).clamp(-1.0, 1.0);
            (amplified * i16::MAX as f32) as i16
        })
        .collect()
}

/// Flatten i16 samples to little-endian PCM bytes.
pub fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
