//! PCM Resampler - convert a synthesized test tone between sample rates.
//!
//! This application exercises the resampling library end to end: it generates a
//! sine tone at the input rate, converts it with the selected method (in one call
//! or streamed in blocks) and prints a JSON report of the result.

mod config;

use std::time::Instant;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

use config::AppConfig;
use pcm_resampler::audio::resampler::{KernelKind, ResampleMethod, Resampler, estimate_output_size, output_frames};
use pcm_resampler::audio::stream::{BufferSource, VecSink, pipe};
use pcm_resampler::audio::util::{downmix_to_mono, f32_to_i16, frame_count, i16_to_f32};

/// Outcome of one conversion run.
#[derive(Debug, Serialize)]
struct RunReport {
    method: ResampleMethod,
    kernel: Option<KernelKind>,
    input_rate: u32,
    output_rate: u32,
    channels: usize,
    input_frames: usize,
    output_frames: usize,
    expected_frames: usize,
    estimated_samples: usize,
    elapsed_us: u128,
    /// Levels of the mono mixdown of the output
    peak: f32,
    rms: f32,
    /// Output quantized to 16-bit PCM, present with `--pcm16`
    #[serde(skip_serializing_if = "Option::is_none")]
    pcm16_peak: Option<i16>,
}

/// Generate an interleaved sine tone with the same signal on every channel.
///
/// # Arguments
/// * `frames` - Number of frames to generate
/// * `channels` - Interleaved channel count
/// * `frequency` - Tone frequency in Hz
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
/// Vector of `frames * channels` samples at half scale
fn synthesize_tone(frames: usize, channels: usize, frequency: f32, sample_rate: u32) -> Vec<f32> {
    let step = 2.0 * std::f64::consts::PI * frequency as f64 / sample_rate as f64;
    (0..frames)
        .flat_map(|i| std::iter::repeat_n((i as f64 * step).sin() as f32 * 0.5, channels))
        .collect()
}

/// Round-trip `samples` through 16-bit PCM.
fn quantize_pcm16(samples: &[f32]) -> Vec<f32> {
    i16_to_f32(&f32_to_i16(samples))
}

/// Peak and RMS level of `samples`.
fn levels(samples: &[f32]) -> (f32, f32) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    let sum_sq: f64 = samples.iter().map(|&s| s as f64 * s as f64).sum();
    (peak, (sum_sq / samples.len() as f64).sqrt() as f32)
}

/// Convert `tone` with `method`, in one call or streamed in blocks.
///
/// # Arguments
/// * `config` - Application configuration
/// * `method` - Resampling method to run
/// * `tone` - Interleaved input samples at the input rate
///
/// # Returns
/// Report describing the conversion
fn run_method(config: &AppConfig, method: ResampleMethod, tone: &[f32]) -> Result<RunReport> {
    let mut resampler = Resampler::new(config.resampler_config(method));
    resampler.initialize().with_context(|| format!("Failed to initialize resampler for {}", method))?;

    let start = Instant::now();
    let output = if config.chunk_frames == 0 {
        resampler.process(tone).context("Resampling failed")?
    } else {
        let mut source = BufferSource::new(tone.to_vec(), config.input_rate, config.channels);
        let mut sink = VecSink::new(config.output_rate, config.channels);
        pipe(&mut source, &mut resampler, &mut sink, config.chunk_frames).context("Streaming resampling failed")?;
        sink.into_samples()
    };
    let elapsed = start.elapsed();

    let input_frames = frame_count(tone.len(), config.channels);
    let (peak, rms) = levels(&downmix_to_mono(&output, config.channels));
    let pcm16_peak = config
        .pcm16
        .then(|| f32_to_i16(&output).into_iter().map(|s| s.saturating_abs()).max().unwrap_or(0));

    debug!("{}: {} -> {} samples in {:?}", method, tone.len(), output.len(), elapsed);

    Ok(RunReport {
        // Reflects a fallback to linear when the backend is not built in.
        method: resampler.config().method,
        kernel: resampler.kernel(),
        input_rate: config.input_rate,
        output_rate: config.output_rate,
        channels: config.channels,
        input_frames,
        output_frames: frame_count(output.len(), config.channels),
        expected_frames: output_frames(input_frames, resampler.ratio()),
        estimated_samples: estimate_output_size(tone.len(), config.input_rate, config.output_rate),
        elapsed_us: elapsed.as_micros(),
        peak,
        rms,
        pcm16_peak,
    })
}

fn main() -> Result<()> {
    // Parse command line arguments
    let config = AppConfig::from_args();

    // Respect RUST_LOG env var, fallback to verbose flag, default to info
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| if config.verbose { EnvFilter::try_new("debug") } else { EnvFilter::try_new("info") })
        .context("Failed to build log filter")?;

    // Logs go to stderr so the JSON report on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    info!("PCM Resampler v{}", env!("CARGO_PKG_VERSION"));

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    config.log_config();

    let mut tone = synthesize_tone(config.input_frames(), config.channels, config.frequency, config.input_rate);
    if config.pcm16 {
        tone = quantize_pcm16(&tone);
    }

    let methods: Vec<ResampleMethod> = if config.compare {
        ResampleMethod::value_variants().to_vec()
    } else {
        vec![config.effective_method()]
    };

    let mut reports = Vec::with_capacity(methods.len());
    for method in methods {
        let report = run_method(&config, method, &tone)?;
        info!(
            "{} ({}): {} frames -> {} frames in {} us",
            method,
            report.kernel.map(|k| k.to_string()).unwrap_or_else(|| "uninitialized".to_string()),
            report.input_frames,
            report.output_frames,
            report.elapsed_us
        );
        reports.push(report);
    }

    println!("{}", serde_json::to_string_pretty(&reports)?);

    Ok(())
}
