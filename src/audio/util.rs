//! Sample format and layout helpers for interleaved PCM buffers.

/// Convert signed 16-bit PCM to f32 in `[-1.0, 1.0)`.
///
/// # Arguments
/// * `data` - Interleaved i16 samples
///
/// # Returns
/// Vector of f32 samples, each `sample / 32768`
pub fn i16_to_f32(data: &[i16]) -> Vec<f32> {
    data.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// Convert f32 samples to signed 16-bit PCM.
///
/// Samples outside `[-1.0, 1.0]` are clamped before scaling.
///
/// # Arguments
/// * `data` - Interleaved f32 samples
///
/// # Returns
/// Vector of i16 samples
pub fn f32_to_i16(data: &[f32]) -> Vec<i16> {
    data.iter().map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).collect()
}

/// Mix interleaved multi-channel f32 samples down to mono.
///
/// Handles any channel count:
/// - Mono: Returns a copy of the input
/// - Multi-channel: Averages the channels of each frame
///
/// # Arguments
/// * `data` - Interleaved f32 samples
/// * `channels` - Number of channels
///
/// # Returns
/// Vector of mono f32 samples. A trailing partial frame is dropped.
pub fn downmix_to_mono(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        data.to_vec()
    } else {
        data.chunks_exact(channels).map(|frame| frame.iter().sum::<f32>() / channels as f32).collect()
    }
}

/// Whole frames contained in `samples` interleaved samples.
pub fn frame_count(samples: usize, channels: usize) -> usize {
    if channels == 0 { 0 } else { samples / channels }
}
