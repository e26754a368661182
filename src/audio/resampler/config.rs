//! Resampler configuration and method selection.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::error::ResampleError;

/// Resampling method.
///
/// The two linear methods are always available. The remaining methods need the
/// band-limited backend (the `high-quality` feature); without it they are
/// downgraded to linear interpolation at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleMethod {
    /// Linear interpolation, tail extrapolated against the last two frames
    #[default]
    LinearUp,
    /// Linear interpolation, tail copied from the last frame
    LinearDown,
    /// Band-limited sinc interpolation, best quality
    SincBest,
    /// Band-limited sinc interpolation, medium quality
    SincMedium,
    /// Band-limited sinc interpolation, fastest
    SincFastest,
    /// Zero-order hold
    ZeroOrderHold,
    /// The backend's own linear interpolator (stateful, unlike `LinearUp`/`LinearDown`)
    BackendLinear,
}

impl ResampleMethod {
    /// Pick the linear method matching the conversion direction.
    pub fn linear_for(ratio: f64) -> Self {
        if ratio > 1.0 { ResampleMethod::LinearUp } else { ResampleMethod::LinearDown }
    }

    /// Whether this method needs the optional high-quality backend.
    pub fn requires_backend(self) -> bool {
        !matches!(self, ResampleMethod::LinearUp | ResampleMethod::LinearDown)
    }

    /// Map a C ABI method code to a method.
    ///
    /// `0` (and any unknown code) selects linear interpolation in the direction
    /// given by `ratio`; `1..=5` select the backend methods.
    pub fn from_code(code: i32, ratio: f64) -> Self {
        match code {
            1 => ResampleMethod::SincBest,
            2 => ResampleMethod::SincMedium,
            3 => ResampleMethod::SincFastest,
            4 => ResampleMethod::ZeroOrderHold,
            5 => ResampleMethod::BackendLinear,
            _ => Self::linear_for(ratio),
        }
    }
}

impl std::fmt::Display for ResampleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResampleMethod::LinearUp => write!(f, "linear-up"),
            ResampleMethod::LinearDown => write!(f, "linear-down"),
            ResampleMethod::SincBest => write!(f, "sinc-best"),
            ResampleMethod::SincMedium => write!(f, "sinc-medium"),
            ResampleMethod::SincFastest => write!(f, "sinc-fastest"),
            ResampleMethod::ZeroOrderHold => write!(f, "zero-order-hold"),
            ResampleMethod::BackendLinear => write!(f, "backend-linear"),
        }
    }
}

/// Whether `method` needs the optional high-quality backend.
pub fn method_requires_backend(method: ResampleMethod) -> bool {
    method.requires_backend()
}

fn default_vectorize() -> bool {
    true
}

/// Resampler configuration.
///
/// The conversion ratio is always derived from the two rates via [`ratio`](Self::ratio).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResamplerConfig {
    /// Input sample rate in Hz
    pub input_rate: u32,
    /// Output sample rate in Hz
    pub output_rate: u32,
    /// Interleaved channel count
    pub channels: usize,
    /// Resampling method
    #[serde(default)]
    pub method: ResampleMethod,
    /// Use the vectorized linear kernel when the CPU supports it
    #[serde(default = "default_vectorize")]
    pub vectorize: bool,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            input_rate: 16000,
            output_rate: 48000,
            channels: 1,
            method: ResampleMethod::LinearUp,
            vectorize: true,
        }
    }
}

impl ResamplerConfig {
    /// Create a configuration using the linear method that matches the conversion direction.
    pub fn new(input_rate: u32, output_rate: u32, channels: usize) -> Self {
        let ratio = output_rate as f64 / input_rate as f64;
        Self {
            input_rate,
            output_rate,
            channels,
            method: ResampleMethod::linear_for(ratio),
            vectorize: true,
        }
    }

    /// Set the resampling method.
    pub fn with_method(mut self, method: ResampleMethod) -> Self {
        self.method = method;
        self
    }

    /// Enable or disable the vectorized linear kernel.
    pub fn with_vectorize(mut self, vectorize: bool) -> Self {
        self.vectorize = vectorize;
        self
    }

    /// Conversion ratio, `output_rate / input_rate`.
    pub fn ratio(&self) -> f64 {
        self.output_rate as f64 / self.input_rate as f64
    }

    /// Check rates and channel count.
    pub fn validate(&self) -> Result<(), ResampleError> {
        if self.input_rate == 0 || self.output_rate == 0 {
            return Err(ResampleError::InvalidConfig(format!(
                "sample rates must be positive (input {} Hz, output {} Hz)",
                self.input_rate, self.output_rate
            )));
        }
        if self.channels == 0 {
            return Err(ResampleError::InvalidConfig("channel count must be positive".to_string()));
        }
        Ok(())
    }
}
