//! Audio sample-rate conversion and stream plumbing.
//!
//! This module provides linear (scalar and vectorized) and band-limited
//! resampling of interleaved f32 audio, plus the source/sink adapters and PCM
//! helpers used to connect it to capture and playback code.

pub mod resampler;
pub mod stream;
pub mod util;

pub use resampler::{KernelKind, ResampleError, ResampleMethod, Resampler, ResamplerConfig};
pub use stream::{BufferSource, RingBufferSink, ResamplingSink, SampleSink, SampleSource, VecSink, pipe};
