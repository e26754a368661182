//! Vectorized linear-interpolation kernels.
//!
//! Output frames are computed in fixed-size batches. Source samples and
//! fractions are gathered per lane into stack scratch buffers, blended with
//! fused multiply-add across the lanes, and scattered back into the
//! interleaved output. Results match [`linear`](super::linear) to within
//! ordinary floating-point rounding.
//!
//! Vector support is probed once per process with [`VectorIsa::detect`].

use once_cell::sync::Lazy;
use tracing::info;

use super::linear::{TailPolicy, hold_single_frame, output_frames, source_position};

/// Largest batch any supported instruction set uses (AVX: 8 lanes x 4 registers).
const MAX_BATCH: usize = 32;

/// Registers processed per batch.
const REGISTERS_PER_BATCH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Isa {
    #[cfg(target_arch = "x86_64")]
    AvxFma,
    #[cfg(target_arch = "aarch64")]
    Neon,
}

/// A vector instruction set confirmed to be usable on the running CPU.
///
/// Only obtainable through [`VectorIsa::detect`], so holding one is proof that
/// the corresponding kernels are safe to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorIsa(Isa);

static DETECTED: Lazy<Option<VectorIsa>> = Lazy::new(|| {
    let isa = probe();
    match isa {
        Some(isa) => info!("Vectorized linear resampling enabled ({}, {} frames per batch)", isa.name(), isa.batch_frames()),
        None => info!("No supported vector extension detected, using scalar linear resampling"),
    }
    isa
});

#[allow(unreachable_code)]
fn probe() -> Option<VectorIsa> {
    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("avx") && std::arch::is_x86_feature_detected!("fma") {
            return Some(VectorIsa(Isa::AvxFma));
        }
        return None;
    }

    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            return Some(VectorIsa(Isa::Neon));
        }
        return None;
    }

    None
}

impl VectorIsa {
    /// The vector extension available on this CPU, if any. Probed once and cached.
    pub fn detect() -> Option<VectorIsa> {
        *DETECTED
    }

    /// Human-readable name of the instruction set.
    pub fn name(self) -> &'static str {
        match self.0 {
            #[cfg(target_arch = "x86_64")]
            Isa::AvxFma => "avx+fma",
            #[cfg(target_arch = "aarch64")]
            Isa::Neon => "neon",
        }
    }

    /// f32 lanes per vector register.
    pub fn lanes(self) -> usize {
        match self.0 {
            #[cfg(target_arch = "x86_64")]
            Isa::AvxFma => 8,
            #[cfg(target_arch = "aarch64")]
            Isa::Neon => 4,
        }
    }

    /// Output frames computed per batch.
    pub fn batch_frames(self) -> usize {
        self.lanes() * REGISTERS_PER_BATCH
    }

    /// `out[j] = s0[j] * (1 - frac[j]) + frac[j] * s1[j]` for every lane.
    fn blend(self, s0: &[f32], s1: &[f32], frac: &[f32], out: &mut [f32]) {
        debug_assert!(s0.len() == out.len() && s1.len() == out.len() && frac.len() == out.len());
        match self.0 {
            // SAFETY: `VectorIsa` values only exist after the probe confirmed the features.
            #[cfg(target_arch = "x86_64")]
            Isa::AvxFma => unsafe { x86::blend(s0, s1, frac, out) },
            // SAFETY: as above.
            #[cfg(target_arch = "aarch64")]
            Isa::Neon => unsafe { neon::blend(s0, s1, frac, out) },
        }
    }
}

#[inline]
fn blend_scalar(s0: f32, s1: f32, frac: f32) -> f32 {
    frac.mul_add(s1, s0 * (1.0 - frac))
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use std::arch::x86_64::*;

    use super::blend_scalar;

    #[target_feature(enable = "avx,fma")]
    pub(super) unsafe fn blend(s0: &[f32], s1: &[f32], frac: &[f32], out: &mut [f32]) {
        const LANES: usize = 8;
        let n = out.len();
        let mut i = 0;
        unsafe {
            let ones = _mm256_set1_ps(1.0);
            while i + LANES <= n {
                let v_frac = _mm256_loadu_ps(frac.as_ptr().add(i));
                let v_s0 = _mm256_loadu_ps(s0.as_ptr().add(i));
                let v_s1 = _mm256_loadu_ps(s1.as_ptr().add(i));
                let v_weight0 = _mm256_sub_ps(ones, v_frac);
                let v_result = _mm256_fmadd_ps(v_frac, v_s1, _mm256_mul_ps(v_s0, v_weight0));
                _mm256_storeu_ps(out.as_mut_ptr().add(i), v_result);
                i += LANES;
            }
        }
        for j in i..n {
            out[j] = blend_scalar(s0[j], s1[j], frac[j]);
        }
    }
}

#[cfg(target_arch = "aarch64")]
mod neon {
    use std::arch::aarch64::*;

    use super::blend_scalar;

    #[target_feature(enable = "neon")]
    pub(super) unsafe fn blend(s0: &[f32], s1: &[f32], frac: &[f32], out: &mut [f32]) {
        const LANES: usize = 4;
        let n = out.len();
        let mut i = 0;
        unsafe {
            let ones = vdupq_n_f32(1.0);
            while i + LANES <= n {
                let v_frac = vld1q_f32(frac.as_ptr().add(i));
                let v_s0 = vld1q_f32(s0.as_ptr().add(i));
                let v_s1 = vld1q_f32(s1.as_ptr().add(i));
                let v_weight0 = vsubq_f32(ones, v_frac);
                let v_result = vfmaq_f32(vmulq_f32(v_s0, v_weight0), v_frac, v_s1);
                vst1q_f32(out.as_mut_ptr().add(i), v_result);
                i += LANES;
            }
        }
        for j in i..n {
            out[j] = blend_scalar(s0[j], s1[j], frac[j]);
        }
    }
}

/// Resample interleaved `input` into `output` using `isa`.
///
/// Same contract as [`linear::interpolate_into`](super::linear::interpolate_into),
/// including both tail policies.
pub fn interpolate_into(isa: VectorIsa, input: &[f32], channels: usize, ratio: f64, tail: TailPolicy, output: &mut [f32]) {
    let input_frames = input.len() / channels;
    let out_frames = output_frames(input_frames, ratio);
    let output = &mut output[..out_frames * channels];

    match input_frames {
        0 => return,
        1 => return hold_single_frame(input, channels, output),
        _ => {}
    }

    let last = input_frames - 1;
    let batch = isa.batch_frames().min(MAX_BATCH);

    let mut frac_buf = [0.0f32; MAX_BATCH];
    let mut sample0_buf = [0.0f32; MAX_BATCH];
    let mut sample1_buf = [0.0f32; MAX_BATCH];
    let mut result_buf = [0.0f32; MAX_BATCH];

    for ch in 0..channels {
        let mut i = 0;
        while i < out_frames {
            let vl = batch.min(out_frames - i);

            for j in 0..vl {
                let (src_idx, frac) = source_position(i + j, ratio);
                if src_idx >= last {
                    match tail {
                        TailPolicy::Extrapolate => {
                            frac_buf[j] = 1.0;
                            sample0_buf[j] = input[(last - 1) * channels + ch];
                            sample1_buf[j] = input[last * channels + ch];
                        }
                        TailPolicy::Hold => {
                            frac_buf[j] = 0.0;
                            sample0_buf[j] = input[last * channels + ch];
                            sample1_buf[j] = sample0_buf[j];
                        }
                    }
                } else {
                    frac_buf[j] = frac as f32;
                    sample0_buf[j] = input[src_idx * channels + ch];
                    sample1_buf[j] = input[(src_idx + 1) * channels + ch];
                }
            }

            isa.blend(&sample0_buf[..vl], &sample1_buf[..vl], &frac_buf[..vl], &mut result_buf[..vl]);

            for j in 0..vl {
                output[(i + j) * channels + ch] = result_buf[j];
            }

            i += vl;
        }
    }
}

/// Vectorized linear upsampling kernel.
pub fn upsample(isa: VectorIsa, input: &[f32], channels: usize, ratio: f64) -> Vec<f32> {
    let mut output = vec![0.0f32; output_frames(input.len() / channels, ratio) * channels];
    interpolate_into(isa, input, channels, ratio, TailPolicy::Extrapolate, &mut output);
    output
}

/// Vectorized linear downsampling kernel.
pub fn downsample(isa: VectorIsa, input: &[f32], channels: usize, ratio: f64) -> Vec<f32> {
    let mut output = vec![0.0f32; output_frames(input.len() / channels, ratio) * channels];
    interpolate_into(isa, input, channels, ratio, TailPolicy::Hold, &mut output);
    output
}

/// Samples at or below this magnitude are compared absolutely; the blend terms cancel there.
#[cfg(test)]
const ULP_FLOOR: f32 = 0.1;

/// Largest ULP distance accepted above [`ULP_FLOOR`].
///
/// Scalar math rounds once from f64. The vector path rounds the f32 fraction,
/// the `s0 * (1 - frac)` product and the fma, which lands within 2 ULP in practice.
#[cfg(test)]
const MAX_ULPS: u32 = 4;

#[cfg(test)]
fn ulp_distance(a: f32, b: f32) -> u32 {
    (a.to_bits() as i64 - b.to_bits() as i64).unsigned_abs() as u32
}

/// Assert that vector output matches scalar output sample by sample.
#[cfg(test)]
pub(crate) fn assert_matches_scalar(vector: &[f32], scalar: &[f32]) {
    assert_eq!(vector.len(), scalar.len());
    for (i, (&v, &s)) in vector.iter().zip(scalar).enumerate() {
        if s.abs() > ULP_FLOOR {
            let ulps = ulp_distance(v, s);
            assert!(ulps <= MAX_ULPS, "sample {i}: vector {v} vs scalar {s} ({ulps} ULP)");
        } else {
            assert!((v - s).abs() <= 4.0 * f32::EPSILON, "sample {i}: vector {v} vs scalar {s}");
        }
    }
}
