//! Sample-rate conversion for interleaved f32 audio.
//!
//! [`Resampler`] owns a configuration and dispatches every call to one of three
//! strategies, chosen once at initialization:
//!
//! - scalar linear interpolation (always available, stateless across calls)
//! - vectorized linear interpolation (same results, used when the CPU supports it)
//! - band-limited conversion through rubato (the `high-quality` feature), which
//!   keeps filter state across streaming calls
//!
//! # Example
//! ```
//! use pcm_resampler::audio::resampler::{Resampler, ResamplerConfig};
//!
//! let mut resampler = Resampler::new(ResamplerConfig::new(16000, 48000, 1));
//! let output = resampler.process(&vec![0.0; 100]).unwrap();
//! assert_eq!(output.len(), 300);
//! ```

#[cfg(feature = "high-quality")]
mod backend;
mod config;
mod error;
pub mod linear;
pub mod simd;

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

#[cfg(feature = "high-quality")]
use backend::HighQualityBackend;
pub use config::{ResampleMethod, ResamplerConfig, method_requires_backend};
pub use error::ResampleError;
use linear::TailPolicy;
pub use linear::output_frames;
use simd::VectorIsa;

/// Extra samples added by [`estimate_output_size`] to cover the backend's variable output.
pub const OUTPUT_SIZE_MARGIN: usize = 256;

/// Whether the band-limited backend is compiled into this build.
pub fn is_high_quality_backend_available() -> bool {
    cfg!(feature = "high-quality")
}

/// Estimate the output buffer size for `input_samples` samples.
///
/// Pre-allocated buffers should be sized with this rather than the exact linear
/// formula, so the same call site stays correct whichever method runs.
pub fn estimate_output_size(input_samples: usize, input_rate: u32, output_rate: u32) -> usize {
    let ratio = output_rate as f64 / input_rate as f64;
    ((input_samples as f64 * ratio).ceil() as usize).saturating_add(OUTPUT_SIZE_MARGIN)
}

/// Which processing strategy a resampler dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum KernelKind {
    Scalar,
    Vectorized,
    HighQuality,
}

impl std::fmt::Display for KernelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelKind::Scalar => write!(f, "scalar"),
            KernelKind::Vectorized => write!(f, "vectorized"),
            KernelKind::HighQuality => write!(f, "high-quality"),
        }
    }
}

/// Selected strategy plus any state it owns.
enum Kernel {
    Scalar,
    Vectorized(VectorIsa),
    #[cfg(feature = "high-quality")]
    HighQuality(Box<HighQualityBackend>),
}

impl Kernel {
    fn kind(&self) -> KernelKind {
        match self {
            Kernel::Scalar => KernelKind::Scalar,
            Kernel::Vectorized(_) => KernelKind::Vectorized,
            #[cfg(feature = "high-quality")]
            Kernel::HighQuality(_) => KernelKind::HighQuality,
        }
    }
}

/// Resampler shared between an audio callback and its owner.
pub type SharedResampler = Arc<Mutex<Resampler>>;

/// Sample-rate converter for interleaved multi-channel f32 audio.
///
/// A resampler is not `Clone`: it exclusively owns its backend state, and moving it
/// moves that ownership. Calls on one instance must not overlap; wrap it with
/// [`into_shared`](Self::into_shared) when a callback thread needs access.
pub struct Resampler {
    config: ResamplerConfig,
    ratio: f64,
    kernel: Option<Kernel>,
}

impl Resampler {
    /// Create an uninitialized resampler. Never fails; validation happens in [`initialize`](Self::initialize).
    pub fn new(config: ResamplerConfig) -> Self {
        Self {
            config,
            ratio: config.ratio(),
            kernel: None,
        }
    }

    /// Validate the configuration and select the processing strategy.
    ///
    /// Calling this again after success is a no-op. If the configured method needs the
    /// band-limited backend and this build lacks it, the method is downgraded to linear
    /// interpolation with a warning; that is not an error.
    ///
    /// # Errors
    /// - `InvalidConfig` for a zero rate or channel count
    /// - `BackendInit` if the band-limited backend cannot be constructed
    pub fn initialize(&mut self) -> Result<(), ResampleError> {
        self.ensure_initialized().map(|_| ())
    }

    /// Selected kernel, building it on first use.
    fn ensure_initialized(&mut self) -> Result<&mut Kernel, ResampleError> {
        let kernel = match self.kernel.take() {
            Some(kernel) => kernel,
            None => self.build_kernel()?,
        };
        Ok(self.kernel.insert(kernel))
    }

    fn build_kernel(&mut self) -> Result<Kernel, ResampleError> {
        self.config.validate()?;

        if self.config.method.requires_backend() && !is_high_quality_backend_available() {
            let fallback = ResampleMethod::linear_for(self.ratio);
            warn!("High-quality backend not available, falling back from {} to {}", self.config.method, fallback);
            self.config.method = fallback;
        }

        let kernel = self.select_kernel()?;
        debug!(
            "Resampler initialized: {} Hz -> {} Hz, {} channels, method {}, kernel {}",
            self.config.input_rate,
            self.config.output_rate,
            self.config.channels,
            self.config.method,
            kernel.kind()
        );
        Ok(kernel)
    }

    fn select_kernel(&self) -> Result<Kernel, ResampleError> {
        #[cfg(feature = "high-quality")]
        if self.config.method.requires_backend() {
            let backend = HighQualityBackend::new(self.config.method, self.ratio, self.config.channels)?;
            return Ok(Kernel::HighQuality(Box::new(backend)));
        }

        match VectorIsa::detect() {
            Some(isa) if self.config.vectorize => Ok(Kernel::Vectorized(isa)),
            _ => Ok(Kernel::Scalar),
        }
    }

    /// Clear streaming state without touching the configuration.
    ///
    /// Only the band-limited backend has state to clear.
    pub fn reset(&mut self) {
        #[cfg(feature = "high-quality")]
        if let Some(Kernel::HighQuality(backend)) = self.kernel.as_mut() {
            backend.reset();
            debug!("Resampler state reset");
        }
    }

    fn tail_policy(&self) -> TailPolicy {
        match self.config.method {
            ResampleMethod::LinearUp => TailPolicy::Extrapolate,
            ResampleMethod::LinearDown => TailPolicy::Hold,
            _ if self.ratio > 1.0 => TailPolicy::Extrapolate,
            _ => TailPolicy::Hold,
        }
    }

    fn is_identity(&self) -> bool {
        self.config.input_rate == self.config.output_rate
    }

    /// Output samples the linear kernels produce for `input_samples` samples.
    fn linear_output_len(&self, input_samples: usize) -> usize {
        output_frames(input_samples / self.config.channels, self.ratio) * self.config.channels
    }

    /// Resample a whole buffer in one call.
    ///
    /// Each call is independent: interpolation starts at frame 0 and no state is kept.
    /// Equal input and output rates return an exact copy. A trailing partial frame
    /// is dropped.
    ///
    /// # Returns
    /// `ceil(input_frames * ratio) * channels` samples on the linear paths; on the
    /// band-limited path, the number of frames the backend generated.
    ///
    /// # Errors
    /// Initialization errors, or `BackendProcess` if the backend fails.
    pub fn process(&mut self, samples: &[f32]) -> Result<Vec<f32>, ResampleError> {
        self.initialize()?;

        if samples.is_empty() {
            return Ok(Vec::new());
        }
        if self.is_identity() {
            return Ok(samples.to_vec());
        }

        self.run(samples, true, true)
    }

    /// Resample the next block of a continuous signal.
    ///
    /// The linear kernels are stateless, so this behaves like [`process`](Self::process)
    /// on each block. The band-limited backend carries filter state between calls and
    /// may hold samples back; the final call of a session must set `end_of_input`
    /// to flush them.
    ///
    /// # Errors
    /// Same as [`process`](Self::process).
    pub fn process_streaming(&mut self, samples: &[f32], end_of_input: bool) -> Result<Vec<f32>, ResampleError> {
        self.initialize()?;

        if samples.is_empty() && !end_of_input {
            return Ok(Vec::new());
        }
        if self.is_identity() {
            return Ok(samples.to_vec());
        }

        self.run(samples, end_of_input, false)
    }

    /// Dispatch to the selected kernel.
    ///
    /// `restart` discards any backend session left over from streaming calls.
    #[cfg_attr(not(feature = "high-quality"), allow(unused_variables))]
    fn run(&mut self, samples: &[f32], end_of_input: bool, restart: bool) -> Result<Vec<f32>, ResampleError> {
        let (channels, ratio, tail) = (self.config.channels, self.ratio, self.tail_policy());
        let len = self.linear_output_len(samples.len());

        match self.ensure_initialized()? {
            Kernel::Scalar => {
                let mut output = vec![0.0f32; len];
                linear::interpolate_into(samples, channels, ratio, tail, &mut output);
                Ok(output)
            }
            Kernel::Vectorized(isa) => {
                let mut output = vec![0.0f32; len];
                simd::interpolate_into(*isa, samples, channels, ratio, tail, &mut output);
                Ok(output)
            }
            #[cfg(feature = "high-quality")]
            Kernel::HighQuality(backend) => {
                if restart {
                    backend.reset();
                }
                backend.process(samples, end_of_input)
            }
        }
    }

    /// Resample into a caller-supplied buffer without allocating on the linear paths.
    ///
    /// # Returns
    /// The number of samples written. Zero-length input writes nothing and succeeds.
    ///
    /// # Errors
    /// `BufferTooSmall` if `output` cannot hold the result, plus the errors of [`process`](Self::process).
    pub fn process_into(&mut self, samples: &[f32], output: &mut [f32]) -> Result<usize, ResampleError> {
        self.initialize()?;

        if samples.is_empty() {
            return Ok(0);
        }
        if self.is_identity() {
            return copy_into(samples, output);
        }

        let (channels, ratio, tail) = (self.config.channels, self.ratio, self.tail_policy());
        let needed = self.linear_output_len(samples.len());

        match self.ensure_initialized()? {
            Kernel::Scalar | Kernel::Vectorized(_) if output.len() < needed => Err(ResampleError::BufferTooSmall { needed, capacity: output.len() }),
            Kernel::Scalar => {
                linear::interpolate_into(samples, channels, ratio, tail, output);
                Ok(needed)
            }
            Kernel::Vectorized(isa) => {
                simd::interpolate_into(*isa, samples, channels, ratio, tail, output);
                Ok(needed)
            }
            #[cfg(feature = "high-quality")]
            Kernel::HighQuality(backend) => {
                backend.reset();
                let result = backend.process(samples, true)?;
                copy_into(&result, output)
            }
        }
    }

    /// Conversion ratio, `output_rate / input_rate`.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Whether the output rate is higher than the input rate.
    pub fn is_upsampling(&self) -> bool {
        self.ratio > 1.0
    }

    /// Whether the output rate is lower than the input rate.
    pub fn is_downsampling(&self) -> bool {
        self.ratio < 1.0
    }

    /// Effective configuration. After initialization the method reflects any fallback.
    pub fn config(&self) -> &ResamplerConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.kernel.is_some()
    }

    /// Active strategy, or `None` before initialization.
    pub fn kernel(&self) -> Option<KernelKind> {
        self.kernel.as_ref().map(Kernel::kind)
    }

    /// Wrap the resampler for use from an audio callback thread.
    pub fn into_shared(self) -> SharedResampler {
        Arc::new(Mutex::new(self))
    }
}

fn copy_into(samples: &[f32], output: &mut [f32]) -> Result<usize, ResampleError> {
    if output.len() < samples.len() {
        return Err(ResampleError::BufferTooSmall {
            needed: samples.len(),
            capacity: output.len(),
        });
    }
    output[..samples.len()].copy_from_slice(samples);
    Ok(samples.len())
}

/// Resample `samples` once with a temporary resampler.
///
/// For repeated conversions, keep a [`Resampler`] instead.
///
/// # Example
/// ```
/// use pcm_resampler::audio::resampler::{ResampleMethod, resample};
///
/// let device_audio = resample(&vec![0.0; 24000], 1, 24000, 48000, ResampleMethod::LinearUp).unwrap();
/// assert_eq!(device_audio.len(), 48000);
/// ```
pub fn resample(samples: &[f32], channels: usize, from_rate: u32, to_rate: u32, method: ResampleMethod) -> Result<Vec<f32>, ResampleError> {
    let mut resampler = Resampler::new(ResamplerConfig::new(from_rate, to_rate, channels).with_method(method));
    resampler.process(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATES: [u32; 4] = [8000, 16000, 44100, 48000];

    const ALL_METHODS: [ResampleMethod; 7] = [
        ResampleMethod::LinearUp,
        ResampleMethod::LinearDown,
        ResampleMethod::SincBest,
        ResampleMethod::SincMedium,
        ResampleMethod::SincFastest,
        ResampleMethod::ZeroOrderHold,
        ResampleMethod::BackendLinear,
    ];

    fn ramp(frames: usize, channels: usize) -> Vec<f32> {
        (0..frames * channels).map(|i| ((i * 7919) % 2001) as f32 / 1000.0 - 1.0).collect()
    }

    #[test]
    fn test_new_does_not_initialize() {
        let resampler = Resampler::new(ResamplerConfig::new(0, 48000, 1));
        assert!(!resampler.is_initialized());
        assert_eq!(resampler.kernel(), None);
    }

    #[test]
    fn test_initialize_rejects_invalid_config() {
        for config in [ResamplerConfig::new(0, 48000, 1), ResamplerConfig::new(16000, 0, 1), ResamplerConfig::new(16000, 48000, 0)] {
            let mut resampler = Resampler::new(config);
            assert!(matches!(resampler.initialize(), Err(ResampleError::InvalidConfig(_))));
            assert!(matches!(resampler.process(&[0.0; 4]), Err(ResampleError::InvalidConfig(_))));
            assert!(!resampler.is_initialized());
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut resampler = Resampler::new(ResamplerConfig::new(16000, 48000, 1));
        resampler.initialize().unwrap();
        let kernel = resampler.kernel();
        resampler.initialize().unwrap();
        assert_eq!(resampler.kernel(), kernel);
        assert!(resampler.is_initialized());
    }

    #[test]
    fn test_failed_initialize_leaves_resampler_uninitialized() {
        let mut resampler = Resampler::new(ResamplerConfig::new(16000, 48000, 0));
        assert!(resampler.initialize().is_err());
        assert!(resampler.initialize().is_err());
        assert_eq!(resampler.kernel(), None);
    }

    #[test]
    fn test_process_auto_initializes() {
        let mut resampler = Resampler::new(ResamplerConfig::new(16000, 48000, 1));
        resampler.process(&ramp(10, 1)).unwrap();
        assert!(resampler.is_initialized());
    }

    #[test]
    fn test_identity_is_bit_exact() {
        for channels in [1, 2, 6] {
            let input = ramp(257, channels);
            for method in ALL_METHODS {
                let mut resampler = Resampler::new(ResamplerConfig::new(44100, 44100, channels).with_method(method));
                assert_eq!(resampler.process(&input).unwrap(), input);
                assert_eq!(resampler.process_streaming(&input, false).unwrap(), input);
            }
        }
    }

    #[test]
    fn test_linear_length_law() {
        let mut resampler = Resampler::new(ResamplerConfig::new(16000, 48000, 1));
        assert_eq!(resampler.ratio(), 3.0);
        assert_eq!(resampler.process(&ramp(100, 1)).unwrap().len(), 300);

        for &input_rate in &RATES {
            for &output_rate in &RATES {
                if input_rate == output_rate {
                    continue;
                }
                for channels in [1, 2] {
                    let mut resampler = Resampler::new(ResamplerConfig::new(input_rate, output_rate, channels));
                    let frames = 1000;
                    let expected = output_frames(frames, output_rate as f64 / input_rate as f64) * channels;
                    assert_eq!(resampler.process(&ramp(frames, channels)).unwrap().len(), expected);
                }
            }
        }
    }

    #[test]
    fn test_scalar_and_vectorized_agree_through_resampler() {
        let input: Vec<f32> = (0..999 * 2).map(|i| ((i / 2) as f32 * 0.03 + (i % 2) as f32).sin() * 0.8).collect();
        let mut scalar = Resampler::new(ResamplerConfig::new(44100, 48000, 2).with_vectorize(false));
        let mut auto = Resampler::new(ResamplerConfig::new(44100, 48000, 2));

        let a = scalar.process(&input).unwrap();
        let b = auto.process(&input).unwrap();
        assert_eq!(scalar.kernel(), Some(KernelKind::Scalar));
        simd::assert_matches_scalar(&b, &a);
    }

    #[test]
    fn test_upsample_tail_clamp() {
        let input = ramp(50, 1);
        let mut resampler = Resampler::new(ResamplerConfig::new(16000, 48000, 1).with_vectorize(false));
        let output = resampler.process(&input).unwrap();
        // Last two output frames sit past the final input pair and extrapolate to its end.
        assert_eq!(output[output.len() - 1], input[49]);
        assert_eq!(output[output.len() - 2], input[49]);
    }

    #[test]
    fn test_downsample_tail_copies_last_frame() {
        // 100 frames at 1/3: the last output frame lands on source position 99, the final frame.
        let input = ramp(100, 2);
        for vectorize in [false, true] {
            let mut resampler = Resampler::new(ResamplerConfig::new(48000, 16000, 2).with_vectorize(vectorize));
            let output = resampler.process(&input).unwrap();
            let n = output.len();
            assert_eq!(n, 34 * 2);
            assert_eq!(&output[n - 2..], &input[input.len() - 2..]);
        }
    }

    #[test]
    fn test_downsample_tail_past_last_pair_is_held() {
        // 3 frames at 0.75: output frame 2 maps to source position 2.67, beyond the last pair.
        let input = vec![0.1f32, -0.7, 0.4];
        for vectorize in [false, true] {
            let mut resampler = Resampler::new(ResamplerConfig::new(48000, 36000, 1).with_vectorize(vectorize));
            let output = resampler.process(&input).unwrap();
            assert_eq!(output.len(), 3);
            assert_eq!(output[2], 0.4);
        }
    }

    #[test]
    fn test_downsample_last_frame_before_final_pair_interpolates() {
        // 101 frames at 1/3: the last output frame maps to position 99, between frames 99 and 100.
        let input = ramp(101, 1);
        let mut resampler = Resampler::new(ResamplerConfig::new(48000, 16000, 1).with_vectorize(false));
        let output = resampler.process(&input).unwrap();
        assert_eq!(output.len(), 34);
        assert!((output[33] - input[99]).abs() < 1e-6);
    }

    #[test]
    fn test_process_calls_are_independent() {
        let input = ramp(300, 1);
        for method in ALL_METHODS {
            let mut resampler = Resampler::new(ResamplerConfig::new(48000, 44100, 1).with_method(method));
            let first = resampler.process(&input).unwrap();
            let second = resampler.process(&input).unwrap();
            assert_eq!(first, second, "{method}");
        }
    }

    #[test]
    fn test_linear_streaming_matches_single_shot_per_block() {
        let input = ramp(400, 1);
        let mut streaming = Resampler::new(ResamplerConfig::new(16000, 44100, 1));
        let mut single = Resampler::new(ResamplerConfig::new(16000, 44100, 1));

        for block in input.chunks(100) {
            assert_eq!(streaming.process_streaming(block, false).unwrap(), single.process(block).unwrap());
        }
    }

    #[test]
    fn test_estimate_covers_actual_output() {
        for &input_rate in &RATES {
            for &output_rate in &RATES {
                for frames in [0usize, 1, 2, 100, 10000] {
                    for method in [ResampleMethod::LinearUp, ResampleMethod::LinearDown, ResampleMethod::SincFastest] {
                        let mut resampler = Resampler::new(ResamplerConfig::new(input_rate, output_rate, 1).with_method(method));
                        let output = resampler.process(&ramp(frames, 1)).unwrap();
                        let estimate = estimate_output_size(frames, input_rate, output_rate);
                        assert!(estimate >= output.len(), "{input_rate}->{output_rate} {frames} frames {method}: {estimate} < {}", output.len());
                    }
                }
            }
        }
    }

    #[test]
    fn test_estimate_output_size_zero_input_rate_saturates() {
        assert_eq!(estimate_output_size(10, 0, 48000), usize::MAX);
        assert_eq!(estimate_output_size(0, 0, 48000), OUTPUT_SIZE_MARGIN);
    }

    #[test]
    fn test_estimate_output_size_formula() {
        assert_eq!(estimate_output_size(100, 16000, 48000), 556);
        assert_eq!(estimate_output_size(0, 44100, 48000), 256);
        assert_eq!(estimate_output_size(3, 48000, 16000), 257);
    }

    #[test]
    fn test_zero_length_input_for_every_method() {
        for method in ALL_METHODS {
            let mut resampler = Resampler::new(ResamplerConfig::new(16000, 48000, 2).with_method(method));
            assert!(resampler.process(&[]).unwrap().is_empty(), "{method}");
            assert!(resampler.process_streaming(&[], false).unwrap().is_empty(), "{method}");
            assert!(resampler.process_streaming(&[], true).unwrap().is_empty(), "{method}");
            assert_eq!(resampler.process_into(&[], &mut []).unwrap(), 0);
        }
    }

    #[test]
    fn test_process_into_reports_small_buffer() {
        let mut resampler = Resampler::new(ResamplerConfig::new(16000, 48000, 1));
        let mut small = vec![0.0f32; 10];
        assert_eq!(resampler.process_into(&ramp(100, 1), &mut small), Err(ResampleError::BufferTooSmall { needed: 300, capacity: 10 }));

        let mut big = vec![0.0f32; estimate_output_size(100, 16000, 48000)];
        let written = resampler.process_into(&ramp(100, 1), &mut big).unwrap();
        assert_eq!(written, 300);
        assert_eq!(&big[..written], resampler.process(&ramp(100, 1)).unwrap().as_slice());
    }

    #[test]
    fn test_process_into_identity_copies() {
        let mut resampler = Resampler::new(ResamplerConfig::new(16000, 16000, 1));
        let mut out = vec![0.0f32; 8];
        assert_eq!(resampler.process_into(&[0.5, -0.5], &mut out).unwrap(), 2);
        assert_eq!(&out[..2], &[0.5, -0.5]);
        assert!(matches!(resampler.process_into(&[0.0; 9], &mut out), Err(ResampleError::BufferTooSmall { .. })));
    }

    #[test]
    fn test_queries() {
        let resampler = Resampler::new(ResamplerConfig::new(48000, 16000, 1));
        assert!(resampler.is_downsampling());
        assert!(!resampler.is_upsampling());
        assert_eq!(resampler.config().output_rate, 16000);
    }

    #[test]
    fn test_shared_resampler() {
        let shared = Resampler::new(ResamplerConfig::new(16000, 48000, 1)).into_shared();
        let worker = {
            let shared = shared.clone();
            std::thread::spawn(move || shared.lock().process(&[0.0; 160]).map(|out| out.len()))
        };
        assert_eq!(worker.join().unwrap(), Ok(480));
    }

    #[test]
    fn test_resample_helper() {
        let output = resample(&ramp(10, 2), 2, 8000, 16000, ResampleMethod::LinearUp).unwrap();
        assert_eq!(output.len(), 40);
    }

    #[cfg(not(feature = "high-quality"))]
    #[test]
    fn test_backend_methods_fall_back_to_linear() {
        assert!(!is_high_quality_backend_available());

        let mut up = Resampler::new(ResamplerConfig::new(16000, 48000, 1).with_method(ResampleMethod::SincBest));
        up.initialize().unwrap();
        assert_eq!(up.config().method, ResampleMethod::LinearUp);
        assert_ne!(up.kernel(), Some(KernelKind::HighQuality));

        let mut down = Resampler::new(ResamplerConfig::new(48000, 16000, 1).with_method(ResampleMethod::ZeroOrderHold));
        assert_eq!(down.process(&ramp(30, 1)).unwrap().len(), 10);
        assert_eq!(down.config().method, ResampleMethod::LinearDown);
    }

    #[cfg(feature = "high-quality")]
    mod high_quality {
        use super::*;

        #[test]
        fn test_backend_is_selected() {
            assert!(is_high_quality_backend_available());
            let mut resampler = Resampler::new(ResamplerConfig::new(16000, 48000, 1).with_method(ResampleMethod::SincBest));
            resampler.initialize().unwrap();
            assert_eq!(resampler.kernel(), Some(KernelKind::HighQuality));
            assert_eq!(resampler.config().method, ResampleMethod::SincBest);
        }

        #[test]
        fn test_streaming_flush_releases_tail() {
            let (input_rate, output_rate) = (48000, 16000);
            let ratio = output_rate as f64 / input_rate as f64;
            let mut resampler = Resampler::new(ResamplerConfig::new(input_rate, output_rate, 2).with_method(ResampleMethod::SincMedium));
            let input = ramp(4000, 2);

            let mut streamed = 0;
            for block in input.chunks(480 * 2) {
                streamed += resampler.process_streaming(block, false).unwrap().len();
            }
            let flushed = resampler.process_streaming(&[], true).unwrap();

            assert!(!flushed.is_empty());
            assert_eq!((streamed + flushed.len()) / 2, (4000.0 * ratio).ceil() as usize);
        }

        #[test]
        fn test_missing_end_of_input_loses_tail() {
            let mut resampler = Resampler::new(ResamplerConfig::new(16000, 48000, 1).with_method(ResampleMethod::SincFastest));
            let input = ramp(1500, 1);
            let partial = resampler.process_streaming(&input, false).unwrap();
            assert!(partial.len() < 4500);
        }

        #[test]
        fn test_reset_starts_new_session() {
            let mut resampler = Resampler::new(ResamplerConfig::new(44100, 16000, 1).with_method(ResampleMethod::BackendLinear));
            let input = ramp(3000, 1);

            resampler.process_streaming(&input, false).unwrap();
            resampler.reset();
            let mut after_reset = resampler.process_streaming(&input, false).unwrap();
            after_reset.extend(resampler.process_streaming(&[], true).unwrap());

            let fresh = resampler.process(&input).unwrap();
            assert_eq!(after_reset, fresh);
        }

        #[test]
        fn test_process_into_uses_backend_output() {
            let mut resampler = Resampler::new(ResamplerConfig::new(16000, 48000, 1).with_method(ResampleMethod::ZeroOrderHold));
            let mut out = vec![0.0f32; estimate_output_size(100, 16000, 48000)];
            assert_eq!(resampler.process_into(&ramp(100, 1), &mut out).unwrap(), 300);
        }
    }
}
