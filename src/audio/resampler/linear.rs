//! Scalar linear-interpolation kernels.
//!
//! Each call is self-contained: interpolation restarts at output frame 0 and no
//! phase is carried between calls.

/// How output frames that land on or past the last input frame are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailPolicy {
    /// Blend the final two input frames with `frac = 1.0` (upsampling kernel).
    Extrapolate,
    /// Copy the final input frame verbatim (downsampling kernel).
    Hold,
}

/// Number of output frames produced for `input_frames` at `ratio`.
pub fn output_frames(input_frames: usize, ratio: f64) -> usize {
    (input_frames as f64 * ratio).ceil() as usize
}

/// Real-valued source position of output frame `i`, split into index and fraction.
#[inline]
pub(crate) fn source_position(i: usize, ratio: f64) -> (usize, f64) {
    let src_pos = i as f64 / ratio;
    let src_idx = src_pos as usize;
    (src_idx, src_pos - src_idx as f64)
}

#[inline]
fn lerp(sample0: f32, sample1: f32, frac: f64) -> f32 {
    (sample0 as f64 * (1.0 - frac) + sample1 as f64 * frac) as f32
}

/// Fill `output` with the frames of a single-frame input.
///
/// Both kernels hold the only frame; there is no second frame to blend with.
pub(crate) fn hold_single_frame(input: &[f32], channels: usize, output: &mut [f32]) {
    for frame in output.chunks_exact_mut(channels) {
        frame.copy_from_slice(&input[..channels]);
    }
}

/// Resample interleaved `input` into `output`.
///
/// `output` must hold at least `output_frames(input.len() / channels, ratio) * channels`
/// samples; only that prefix is written.
pub fn interpolate_into(input: &[f32], channels: usize, ratio: f64, tail: TailPolicy, output: &mut [f32]) {
    let input_frames = input.len() / channels;
    let out_frames = output_frames(input_frames, ratio);
    let output = &mut output[..out_frames * channels];

    match input_frames {
        0 => return,
        1 => return hold_single_frame(input, channels, output),
        _ => {}
    }

    let last = input_frames - 1;
    for ch in 0..channels {
        for i in 0..out_frames {
            let (mut src_idx, mut frac) = source_position(i, ratio);

            if src_idx >= last {
                match tail {
                    TailPolicy::Extrapolate => {
                        src_idx = last - 1;
                        frac = 1.0;
                    }
                    TailPolicy::Hold => {
                        output[i * channels + ch] = input[last * channels + ch];
                        continue;
                    }
                }
            }

            let sample0 = input[src_idx * channels + ch];
            let sample1 = input[(src_idx + 1) * channels + ch];
            output[i * channels + ch] = lerp(sample0, sample1, frac);
        }
    }
}

/// Linear upsampling kernel.
pub fn upsample(input: &[f32], channels: usize, ratio: f64) -> Vec<f32> {
    let mut output = vec![0.0f32; output_frames(input.len() / channels, ratio) * channels];
    interpolate_into(input, channels, ratio, TailPolicy::Extrapolate, &mut output);
    output
}

/// Linear downsampling kernel.
pub fn downsample(input: &[f32], channels: usize, ratio: f64) -> Vec<f32> {
    let mut output = vec![0.0f32; output_frames(input.len() / channels, ratio) * channels];
    interpolate_into(input, channels, ratio, TailPolicy::Hold, &mut output);
    output
}
