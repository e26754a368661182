//! Error taxonomy for resampling operations.

use thiserror::Error;

/// Errors reported by [`Resampler`](super::Resampler) and its kernels.
///
/// None of these are retried internally; the call that triggered the error
/// reports it and leaves recovery to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResampleError {
    /// Non-positive sample rate or channel count.
    #[error("invalid resampler configuration: {0}")]
    InvalidConfig(String),

    /// The high-quality backend could not be constructed.
    #[error("failed to create high-quality backend: {0}")]
    BackendInit(String),

    /// The high-quality backend failed mid-stream.
    #[error("high-quality backend processing failed: {0}")]
    BackendProcess(String),

    /// A caller-supplied output buffer cannot hold the result.
    #[error("output buffer too small: {needed} samples needed, capacity is {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },
}

#[cfg(feature = "high-quality")]
impl From<rubato::ResamplerConstructionError> for ResampleError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        ResampleError::BackendInit(e.to_string())
    }
}

#[cfg(feature = "high-quality")]
impl From<rubato::ResampleError> for ResampleError {
    fn from(e: rubato::ResampleError) -> Self {
        ResampleError::BackendProcess(e.to_string())
    }
}
