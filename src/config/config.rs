//! Application configuration and CLI argument parsing.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::info;

use pcm_resampler::audio::resampler::{ResampleMethod, ResamplerConfig, is_high_quality_backend_available};

/// Resampler demo configuration.
///
/// The demo synthesizes a test tone at the input rate, converts it and prints a
/// JSON report of the result.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "pcm-resampler")]
#[command(author, version, about = "Convert a synthesized test tone between sample rates", long_about = None)]
pub struct AppConfig {
    /// List all resampling methods and exit
    #[arg(long)]
    pub list_methods: bool,

    /// Input sample rate in Hz
    #[arg(long, short = 'i', env = "RESAMPLER_INPUT_RATE", default_value = "16000")]
    pub input_rate: u32,

    /// Output sample rate in Hz
    #[arg(long, short = 'o', env = "RESAMPLER_OUTPUT_RATE", default_value = "48000")]
    pub output_rate: u32,

    /// Interleaved channel count
    #[arg(long, short = 'c', default_value = "1")]
    pub channels: usize,

    /// Resampling method (linear in the conversion direction if not specified)
    #[arg(long, short = 'm', value_enum)]
    pub method: Option<ResampleMethod>,

    /// Disable the vectorized linear kernel
    #[arg(long)]
    pub no_vectorize: bool,

    /// Test tone frequency in Hz
    #[arg(long, default_value = "440")]
    pub frequency: f32,

    /// Test tone duration in seconds
    #[arg(long, default_value = "1.0", value_parser = parse_duration)]
    pub duration: f32,

    /// Stream the tone in blocks of this many frames (0 = single call)
    #[arg(long, default_value = "0")]
    pub chunk_frames: usize,

    /// Quantize the tone to 16-bit PCM before resampling and the output after
    #[arg(long)]
    pub pcm16: bool,

    /// Run every method on the same tone and report each
    #[arg(long)]
    pub compare: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl AppConfig {
    /// Parse configuration from command line arguments.
    pub fn from_args() -> Self {
        let config = Self::parse();

        if config.list_methods {
            print_methods();
            std::process::exit(0);
        }

        config
    }

    /// Effective method: the requested one, or linear in the conversion direction.
    pub fn effective_method(&self) -> ResampleMethod {
        self.method.unwrap_or_else(|| ResampleMethod::linear_for(self.output_rate as f64 / self.input_rate as f64))
    }

    /// Build the resampler configuration for `method`.
    pub fn resampler_config(&self, method: ResampleMethod) -> ResamplerConfig {
        ResamplerConfig::new(self.input_rate, self.output_rate, self.channels)
            .with_method(method)
            .with_vectorize(!self.no_vectorize)
    }

    /// Frames in the synthesized test tone.
    pub fn input_frames(&self) -> usize {
        (self.duration as f64 * self.input_rate as f64).round() as usize
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.input_rate == 0 || self.output_rate == 0 {
            anyhow::bail!("Sample rates must be positive");
        }

        if self.channels == 0 {
            anyhow::bail!("Channel count must be positive");
        }

        if self.frequency <= 0.0 || self.frequency >= self.input_rate as f32 / 2.0 {
            anyhow::bail!("Tone frequency must be between 0 and {} Hz (half the input rate)", self.input_rate / 2);
        }

        Ok(())
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!("Configuration:");
        info!("  Input rate: {} Hz", self.input_rate);
        info!("  Output rate: {} Hz", self.output_rate);
        info!("  Channels: {}", self.channels);
        if self.compare {
            info!("  Method: all (compare)");
        } else {
            info!("  Method: {}", self.effective_method());
        }
        info!("  Vectorize: {}", !self.no_vectorize);
        info!("  Tone: {} Hz for {}s", self.frequency, self.duration);
        if self.pcm16 {
            info!("  Sample format: 16-bit PCM round trip");
        }
        if self.chunk_frames > 0 {
            info!("  Streaming: {} frames per block", self.chunk_frames);
        }
        info!("  High-quality backend: {}", if is_high_quality_backend_available() { "available" } else { "not built" });
    }
}

/// Print every method and whether it runs natively in this build.
fn print_methods() {
    let backend = is_high_quality_backend_available();
    println!("Available resampling methods:");
    for method in ResampleMethod::value_variants() {
        let note = match (method.requires_backend(), backend) {
            (false, _) => "linear",
            (true, true) => "high-quality backend",
            (true, false) => "falls back to linear (built without high-quality)",
        };
        println!("  {:<16} {}", method.to_string(), note);
    }
}

/// Parse and validate a duration in seconds (0.0-600.0].
fn parse_duration(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{}' is not a valid float", s))?;
    if value > 0.0 && value <= 600.0 {
        Ok(value)
    } else {
        Err(format!("duration must be between 0 and 600 seconds, got {}", value))
    }
}
