//! Streaming sample-rate conversion for interleaved f32 audio.
//!
//! The [`audio::resampler`] module holds the engine: scalar and vectorized
//! linear interpolation, and an optional band-limited backend built on rubato
//! (the `high-quality` feature, enabled by default). [`audio::stream`] connects
//! it to capture and playback code, and [`ffi`] exposes a small C ABI.

pub mod audio;
pub mod ffi;
