//! Producer/consumer interfaces for feeding audio through a resampler.
//!
//! Capture and playback collaborators live outside this crate; they exchange
//! interleaved f32 samples through [`SampleSource`] and [`SampleSink`].

use ringbuf::traits::{Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::{debug, error, warn};

use super::resampler::{ResampleError, ResampleMethod, Resampler, ResamplerConfig};

/// Something that produces interleaved f32 samples at a fixed rate.
pub trait SampleSource {
    fn sample_rate(&self) -> u32;

    fn channels(&self) -> usize;

    /// Fill `buf` with up to `buf.len()` samples. Returns 0 once the source is exhausted.
    fn read(&mut self, buf: &mut [f32]) -> usize;
}

/// Something that consumes interleaved f32 samples at a fixed rate.
pub trait SampleSink {
    fn sample_rate(&self) -> u32;

    fn channels(&self) -> usize;

    /// Accept samples. Returns how many were taken.
    fn write(&mut self, samples: &[f32]) -> usize;
}

/// In-memory source over an owned sample buffer.
pub struct BufferSource {
    samples: Vec<f32>,
    position: usize,
    sample_rate: u32,
    channels: usize,
}

impl BufferSource {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: usize) -> Self {
        Self {
            samples,
            position: 0,
            sample_rate,
            channels,
        }
    }

    /// Samples not yet read.
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.position
    }
}

impl SampleSource for BufferSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn read(&mut self, buf: &mut [f32]) -> usize {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.samples[self.position..self.position + n]);
        self.position += n;
        n
    }
}

/// Sink that collects everything written to it.
pub struct VecSink {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: usize,
}

impl VecSink {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
            channels,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

impl SampleSink for VecSink {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn write(&mut self, samples: &[f32]) -> usize {
        self.samples.extend_from_slice(samples);
        samples.len()
    }
}

/// Sink that queues samples into a lock-free ring buffer for a real-time consumer.
///
/// The consumer half is handed to the playback callback; this half is written from
/// the producing thread. Samples that do not fit are dropped and counted.
pub struct RingBufferSink {
    producer: HeapProd<f32>,
    dropped: usize,
    sample_rate: u32,
    channels: usize,
}

impl RingBufferSink {
    /// Create a sink and the matching consumer.
    ///
    /// # Arguments
    /// * `sample_rate` - Rate the consumer plays at
    /// * `channels` - Interleaved channel count
    /// * `capacity` - Ring buffer size in samples
    ///
    /// # Returns
    /// The sink and the consumer half of its ring buffer
    pub fn new(sample_rate: u32, channels: usize, capacity: usize) -> (Self, HeapCons<f32>) {
        let ring = HeapRb::<f32>::new(capacity);
        let (producer, consumer) = ring.split();

        let sink = Self {
            producer,
            dropped: 0,
            sample_rate,
            channels,
        };
        (sink, consumer)
    }

    /// Total samples dropped because the ring buffer was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Samples currently queued and not yet consumed.
    pub fn queued(&self) -> usize {
        self.producer.occupied_len()
    }
}

impl SampleSink for RingBufferSink {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn write(&mut self, samples: &[f32]) -> usize {
        let written = self.producer.push_slice(samples);
        if written < samples.len() {
            let dropped = samples.len() - written;
            self.dropped += dropped;
            warn!("Playback buffer overflow, dropped {} samples", dropped);
        }
        written
    }
}

/// Adapts a sink running at one rate into a sink that accepts another.
///
/// Writes are streamed through a [`Resampler`] into the inner sink. Call
/// [`finish`](Self::finish) at the end of a stream so buffered samples reach the sink.
/// Resampled output the inner sink refuses is counted in [`dropped`](Self::dropped).
pub struct ResamplingSink<S: SampleSink> {
    inner: S,
    resampler: Resampler,
    input_rate: u32,
    dropped: usize,
}

impl<S: SampleSink> ResamplingSink<S> {
    /// Wrap `inner` so it accepts audio at `input_rate`.
    ///
    /// # Errors
    /// Returns the resampler's initialization error.
    pub fn new(inner: S, input_rate: u32, method: ResampleMethod) -> Result<Self, ResampleError> {
        let config = ResamplerConfig::new(input_rate, inner.sample_rate(), inner.channels()).with_method(method);
        let mut resampler = Resampler::new(config);
        resampler.initialize()?;

        debug!("Resampling sink: {} Hz -> {} Hz ({})", input_rate, inner.sample_rate(), resampler.config().method);

        Ok(Self {
            inner,
            resampler,
            input_rate,
            dropped: 0,
        })
    }

    /// Hand resampled output to the inner sink, counting what it refuses.
    fn forward(&mut self, resampled: &[f32]) -> usize {
        let accepted = self.inner.write(resampled);
        if accepted < resampled.len() {
            self.dropped += resampled.len() - accepted;
        }
        accepted
    }

    /// Resampled samples the inner sink refused so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Flush buffered samples into the inner sink and start a new session.
    ///
    /// # Returns
    /// Samples the inner sink accepted from the flush.
    pub fn finish(&mut self) -> Result<usize, ResampleError> {
        let tail = self.resampler.process_streaming(&[], true)?;
        Ok(self.forward(&tail))
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: SampleSink> SampleSink for ResamplingSink<S> {
    fn sample_rate(&self) -> u32 {
        self.input_rate
    }

    fn channels(&self) -> usize {
        self.inner.channels()
    }

    /// Returns the input samples consumed by the resampler. Output the inner sink
    /// refuses does not reduce this count; it is added to [`dropped`](ResamplingSink::dropped).
    fn write(&mut self, samples: &[f32]) -> usize {
        match self.resampler.process_streaming(samples, false) {
            Ok(resampled) => {
                self.forward(&resampled);
                samples.len()
            }
            Err(e) => {
                error!("Resampling failed: {}, dropping {} samples", e, samples.len());
                0
            }
        }
    }
}

/// Stream `source` through `resampler` into `sink`, `chunk_frames` frames at a time.
///
/// The final resampler call sets `end_of_input` so the band-limited backend
/// releases its tail.
///
/// # Returns
/// Total samples the sink accepted.
///
/// # Errors
/// `InvalidConfig` if rates or channel counts do not line up with the resampler's
/// configuration or `chunk_frames` is zero, plus any processing error.
pub fn pipe(source: &mut dyn SampleSource, resampler: &mut Resampler, sink: &mut dyn SampleSink, chunk_frames: usize) -> Result<usize, ResampleError> {
    let config = *resampler.config();

    if chunk_frames == 0 {
        return Err(ResampleError::InvalidConfig("chunk size must be positive".to_string()));
    }
    if source.sample_rate() != config.input_rate || sink.sample_rate() != config.output_rate {
        return Err(ResampleError::InvalidConfig(format!(
            "rate mismatch: source {} Hz, sink {} Hz, resampler {} Hz -> {} Hz",
            source.sample_rate(),
            sink.sample_rate(),
            config.input_rate,
            config.output_rate
        )));
    }
    if source.channels() != config.channels || sink.channels() != config.channels {
        return Err(ResampleError::InvalidConfig(format!(
            "channel mismatch: source {}, sink {}, resampler {}",
            source.channels(),
            sink.channels(),
            config.channels
        )));
    }

    let mut buf = vec![0.0f32; chunk_frames * config.channels];
    let mut written = 0;

    loop {
        let n = source.read(&mut buf);
        if n == 0 {
            break;
        }
        let resampled = resampler.process_streaming(&buf[..n], false)?;
        written += sink.write(&resampled);
    }

    let tail = resampler.process_streaming(&[], true)?;
    written += sink.write(&tail);

    debug!("Pipe finished: {} samples written at {} Hz", written, config.output_rate);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use ringbuf::traits::Consumer;

    use super::*;
    use crate::audio::resampler::output_frames;

    fn tone(frames: usize) -> Vec<f32> {
        (0..frames).map(|i| (i as f32 * 0.02).sin() * 0.5).collect()
    }

    #[test]
    fn test_buffer_source_reads_until_exhausted() {
        let mut source = BufferSource::new(vec![1.0, 2.0, 3.0, 4.0, 5.0], 16000, 1);
        let mut buf = [0.0f32; 2];
        assert_eq!(source.read(&mut buf), 2);
        assert_eq!(source.read(&mut buf), 2);
        assert_eq!(source.read(&mut buf), 1);
        assert_eq!(buf[0], 5.0);
        assert_eq!(source.read(&mut buf), 0);
    }

    #[test]
    fn test_pipe_linear_matches_per_chunk_length() {
        let mut source = BufferSource::new(tone(1000), 16000, 1);
        let mut resampler = Resampler::new(ResamplerConfig::new(16000, 44100, 1));
        let mut sink = VecSink::new(44100, 1);

        let written = pipe(&mut source, &mut resampler, &mut sink, 250).unwrap();

        // Linear blocks are resampled independently.
        let expected = 4 * output_frames(250, 44100.0 / 16000.0);
        assert_eq!(written, expected);
        assert_eq!(sink.samples().len(), expected);
    }

    #[test]
    fn test_pipe_rejects_mismatch() {
        let mut resampler = Resampler::new(ResamplerConfig::new(16000, 48000, 1));
        let mut sink = VecSink::new(48000, 1);

        let mut wrong_rate = BufferSource::new(tone(10), 8000, 1);
        assert!(matches!(pipe(&mut wrong_rate, &mut resampler, &mut sink, 10), Err(ResampleError::InvalidConfig(_))));

        let mut wrong_channels = BufferSource::new(tone(10), 16000, 2);
        assert!(matches!(pipe(&mut wrong_channels, &mut resampler, &mut sink, 10), Err(ResampleError::InvalidConfig(_))));

        let mut source = BufferSource::new(tone(10), 16000, 1);
        assert!(matches!(pipe(&mut source, &mut resampler, &mut sink, 0), Err(ResampleError::InvalidConfig(_))));
    }

    #[test]
    fn test_ring_buffer_sink_counts_drops() {
        let (mut sink, mut consumer) = RingBufferSink::new(48000, 1, 8);
        assert_eq!(sink.write(&[0.1; 5]), 5);
        assert_eq!(sink.write(&[0.2; 5]), 3);
        assert_eq!(sink.dropped(), 2);
        assert_eq!(sink.queued(), 8);

        let mut out = [0.0f32; 8];
        assert_eq!(consumer.pop_slice(&mut out), 8);
        assert_eq!(out[7], 0.2);
        assert_eq!(sink.queued(), 0);
    }

    #[test]
    fn test_resampling_sink_feeds_ring_buffer() {
        let (ring, mut consumer) = RingBufferSink::new(48000, 1, 4096);
        let mut sink = ResamplingSink::new(ring, 16000, ResampleMethod::LinearUp).unwrap();
        assert_eq!(sink.sample_rate(), 16000);

        assert_eq!(sink.write(&tone(160)), 160);
        sink.finish().unwrap();

        assert_eq!(sink.inner().queued(), 480);
        let mut out = vec![0.0f32; 480];
        assert_eq!(consumer.pop_slice(&mut out), 480);
    }

    #[test]
    fn test_resampling_sink_counts_refused_output() {
        let (ring, _consumer) = RingBufferSink::new(48000, 1, 400);
        let mut sink = ResamplingSink::new(ring, 16000, ResampleMethod::LinearUp).unwrap();

        assert_eq!(sink.write(&tone(160)), 160);
        assert_eq!(sink.dropped(), 80);
        assert_eq!(sink.inner().dropped(), 80);
        assert_eq!(sink.inner().queued(), 400);

        assert_eq!(sink.finish().unwrap(), 0);
        assert_eq!(sink.dropped(), 80);
    }

    #[cfg(feature = "high-quality")]
    #[test]
    fn test_pipe_flushes_backend_tail() {
        let mut source = BufferSource::new(tone(5000), 48000, 1);
        let mut resampler = Resampler::new(ResamplerConfig::new(48000, 16000, 1).with_method(ResampleMethod::SincFastest));
        let mut sink = VecSink::new(16000, 1);

        let written = pipe(&mut source, &mut resampler, &mut sink, 480).unwrap();
        assert_eq!(written, output_frames(5000, 16000.0 / 48000.0));
    }

    #[cfg(feature = "high-quality")]
    #[test]
    fn test_resampling_sink_finish_releases_backend_tail() {
        let mut sink = ResamplingSink::new(VecSink::new(16000, 1), 48000, ResampleMethod::SincMedium).unwrap();
        for chunk in tone(3000).chunks(300) {
            sink.write(chunk);
        }
        assert!(sink.finish().unwrap() > 0);
        assert_eq!(sink.into_inner().into_samples().len(), 1000);
    }
}
