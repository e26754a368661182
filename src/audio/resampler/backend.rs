//! Band-limited resampling backend using rubato.
//!
//! Unlike the linear kernels, this backend carries filter history across
//! streaming calls. Input is accumulated until a full chunk is available, the
//! filter's warm-up delay is discarded, and an end-of-input call flushes the
//! filter tail so the session produces exactly `ceil(input_frames * ratio)`
//! frames in total.

use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Async, FixedAsync, PolynomialDegree, Resampler as _, SincInterpolationParameters, SincInterpolationType, WindowFunction};
use tracing::{debug, error};

use super::config::ResampleMethod;
use super::error::ResampleError;

/// Input frames per backend processing block.
const CHUNK_SIZE: usize = 1024;

/// Upper bound on zero-padded blocks pushed through while flushing.
const MAX_FLUSH_CHUNKS: usize = 64;

fn sinc_params(sinc_len: usize, oversampling_factor: usize, interpolation: SincInterpolationType) -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len,
        f_cutoff: rubato::calculate_cutoff(sinc_len, WindowFunction::BlackmanHarris2),
        interpolation,
        oversampling_factor,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Streaming state for one band-limited resampling session.
pub(crate) struct HighQualityBackend {
    resampler: Async<f32>,
    channels: usize,
    ratio: f64,
    /// Interleaved input not yet consumed by the resampler.
    pending: Vec<f32>,
    /// Scratch output for one block.
    scratch: Vec<f32>,
    /// Warm-up frames still to discard.
    delay_remaining: usize,
    /// Real input frames accepted in this session.
    frames_in: usize,
    /// Frames returned to the caller in this session.
    frames_out: usize,
}

impl HighQualityBackend {
    /// Create backend state for `method`.
    ///
    /// # Errors
    /// Returns `BackendInit` if `method` is not a backend method or rubato rejects the parameters.
    pub fn new(method: ResampleMethod, ratio: f64, channels: usize) -> Result<Self, ResampleError> {
        let fixed = FixedAsync::Input;
        let resampler = match method {
            ResampleMethod::SincBest => Async::<f32>::new_sinc(ratio, 1.0, &sinc_params(256, 256, SincInterpolationType::Cubic), CHUNK_SIZE, channels, fixed)?,
            ResampleMethod::SincMedium => Async::<f32>::new_sinc(ratio, 1.0, &sinc_params(128, 256, SincInterpolationType::Linear), CHUNK_SIZE, channels, fixed)?,
            ResampleMethod::SincFastest => Async::<f32>::new_sinc(ratio, 1.0, &sinc_params(64, 128, SincInterpolationType::Linear), CHUNK_SIZE, channels, fixed)?,
            ResampleMethod::ZeroOrderHold => Async::<f32>::new_poly(ratio, 1.0, PolynomialDegree::Nearest, CHUNK_SIZE, channels, fixed)?,
            ResampleMethod::BackendLinear => Async::<f32>::new_poly(ratio, 1.0, PolynomialDegree::Linear, CHUNK_SIZE, channels, fixed)?,
            ResampleMethod::LinearUp | ResampleMethod::LinearDown => {
                return Err(ResampleError::BackendInit(format!("{method} does not use the high-quality backend")));
            }
        };

        let output_frames_max = resampler.output_frames_max();
        let delay_remaining = resampler.output_delay();

        debug!("High-quality backend created: {} ({} channels, ratio {:.4}, delay {} frames)", method, channels, ratio, delay_remaining);

        Ok(Self {
            resampler,
            channels,
            ratio,
            pending: Vec::with_capacity(CHUNK_SIZE * channels * 2),
            scratch: vec![0.0f32; output_frames_max * channels],
            delay_remaining,
            frames_in: 0,
            frames_out: 0,
        })
    }

    /// Clear filter history and session counters.
    pub fn reset(&mut self) {
        self.resampler.reset();
        self.pending.clear();
        self.delay_remaining = self.resampler.output_delay();
        self.frames_in = 0;
        self.frames_out = 0;
    }

    /// Feed `input` and return whatever output is ready.
    ///
    /// With `end_of_input` set, buffered input and the filter tail are flushed and
    /// the session is reset afterwards.
    pub fn process(&mut self, input: &[f32], end_of_input: bool) -> Result<Vec<f32>, ResampleError> {
        let frames = input.len() / self.channels;
        self.pending.extend_from_slice(&input[..frames * self.channels]);
        self.frames_in += frames;

        let mut output = Vec::with_capacity(((frames as f64 * self.ratio).ceil() as usize + CHUNK_SIZE) * self.channels);

        while self.pending.len() / self.channels >= self.resampler.input_frames_next() {
            self.process_block(&mut output)?;
        }

        if end_of_input {
            self.flush(&mut output)?;
            self.reset();
        }

        Ok(output)
    }

    fn flush(&mut self, output: &mut Vec<f32>) -> Result<(), ResampleError> {
        let expected = (self.frames_in as f64 * self.ratio).ceil() as usize;
        let mut blocks = 0;

        while self.frames_out < expected && blocks < MAX_FLUSH_CHUNKS {
            let needed = self.resampler.input_frames_next() * self.channels;
            if self.pending.len() < needed {
                self.pending.resize(needed, 0.0);
            }
            if self.process_block(output)? == 0 {
                break;
            }
            blocks += 1;
        }

        if self.frames_out > expected {
            let excess = self.frames_out - expected;
            output.truncate(output.len() - excess * self.channels);
            self.frames_out = expected;
        }

        debug!("High-quality backend flushed: {} frames in, {} frames out ({} blocks)", self.frames_in, self.frames_out, blocks);
        Ok(())
    }

    /// Run one block through the resampler, appending non-delay output. Returns raw frames produced.
    fn process_block(&mut self, output: &mut Vec<f32>) -> Result<usize, ResampleError> {
        let channels = self.channels;
        let in_frames = self.resampler.input_frames_next();
        let out_frames_max = self.scratch.len() / channels;

        let (consumed, produced) = {
            let input_adapter =
                InterleavedSlice::new(&self.pending[..in_frames * channels], channels, in_frames).map_err(|e| ResampleError::BackendProcess(e.to_string()))?;
            let mut output_adapter =
                InterleavedSlice::new_mut(&mut self.scratch, channels, out_frames_max).map_err(|e| ResampleError::BackendProcess(e.to_string()))?;

            self.resampler.process_into_buffer(&input_adapter, &mut output_adapter, None).map_err(|e| {
                error!("High-quality backend error: {}", e);
                ResampleError::from(e)
            })?
        };

        self.pending.drain(..consumed.min(in_frames) * channels);

        let skip = self.delay_remaining.min(produced);
        self.delay_remaining -= skip;
        output.extend_from_slice(&self.scratch[skip * channels..produced * channels]);
        self.frames_out += produced - skip;

        Ok(produced)
    }
}
