use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use hound::WavReader;

use crate::error::{FilterError, Result};

/// Notification delivered by a capture source
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A block of mono samples in capture order
    Chunk {
        samples: Vec<f32>,
        frames: usize,
        captured_at: Duration,
    },
    /// Device status or error report; capture keeps running
    Status(String),
}

impl CaptureEvent {
    pub fn chunk(samples: Vec<f32>, captured_at: Duration) -> Self {
        let frames = samples.len();
        Self::Chunk {
            samples,
            frames,
            captured_at,
        }
    }
}

/// Something that delivers mono sample chunks until stopped
pub trait CaptureSource {
    fn sample_rate(&self) -> u32;

    /// Frames per callback when delivery runs on a real-time audio thread
    fn realtime_buffer_frames(&self) -> Option<u32> {
        None
    }

    /// Begin delivering events to `tx`
    fn start(&mut self, tx: Sender<CaptureEvent>) -> Result<Box<dyn CaptureStream>>;
}

/// Handle to a running capture
pub trait CaptureStream {
    /// Halt delivery. Every sender handed to `CaptureSource::start` is
    /// dropped by the time this returns.
    fn stop(self: Box<Self>);
}

/// Capture source replaying an in-memory buffer in fixed-size chunks
///
/// Delivery runs on its own thread and ends when the buffer is exhausted
/// or the stream is stopped, whichever comes first.
pub struct BufferSource {
    samples: Arc<Vec<f32>>,
    sample_rate: u32,
    chunk_size: usize,
}

impl BufferSource {
    pub fn new(samples: Vec<f32>, sample_rate: u32, chunk_size: usize) -> Self {
        Self {
            samples: Arc::new(samples),
            sample_rate,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Load channel 0 of a WAV file
    pub fn from_wav<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self> {
        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(FilterError::Config("WAV file has no channels".into()));
        }

        let interleaved = Self::read_samples(reader, &spec)?;
        let samples = interleaved
            .iter()
            .step_by(spec.channels as usize)
            .copied()
            .collect::<Vec<_>>();

        log::info!(
            "Loaded {} samples at {} Hz from {}",
            samples.len(),
            spec.sample_rate,
            path.as_ref().display()
        );

        Ok(Self::new(samples, spec.sample_rate, chunk_size))
    }

    fn read_samples(
        mut reader: WavReader<BufReader<File>>,
        spec: &hound::WavSpec,
    ) -> Result<Vec<f32>> {
        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max_val = int_full_scale(spec.bits_per_sample)?;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Magnitude of the most negative sample at an integer bit depth
fn int_full_scale(bits_per_sample: u16) -> Result<f32> {
    if !(1..=32).contains(&bits_per_sample) {
        return Err(FilterError::Config(format!(
            "Unsupported WAV bit depth: {}",
            bits_per_sample
        )));
    }
    Ok((1_i64 << (bits_per_sample - 1)) as f32)
}

impl CaptureSource for BufferSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, tx: Sender<CaptureEvent>) -> Result<Box<dyn CaptureStream>> {
        let samples = Arc::clone(&self.samples);
        let chunk_size = self.chunk_size;
        let sample_rate = self.sample_rate;
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("buffer-source".into())
            .spawn(move || {
                let mut position = 0;
                for chunk in samples.chunks(chunk_size) {
                    if stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    let captured_at = Duration::from_secs_f64(position as f64 / sample_rate as f64);
                    if tx.send(CaptureEvent::chunk(chunk.to_vec(), captured_at)).is_err() {
                        log::warn!("Capture receiver dropped");
                        break;
                    }
                    position += chunk.len();
                }
                log::debug!("Buffer source delivered {} samples", position);
            })?;

        Ok(Box::new(BufferStream {
            stop,
            handle: Some(handle),
        }))
    }
}

struct BufferStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CaptureStream for BufferStream {
    fn stop(mut self: Box<Self>) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Buffer source thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_source_delivers_all_chunks_in_order() {
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let mut source = BufferSource::new(samples.clone(), 8000, 4);
        let (tx, rx) = crossbeam_channel::unbounded();

        let stream = source.start(tx).unwrap();
        let mut received = Vec::new();
        let mut sizes = Vec::new();
        for event in rx.iter() {
            if let CaptureEvent::Chunk {
                samples, frames, ..
            } = event
            {
                sizes.push(frames);
                received.extend(samples);
            }
        }
        stream.stop();

        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(received, samples);
    }

    #[test]
    fn test_chunk_timestamps_follow_position() {
        let mut source = BufferSource::new(vec![0.0; 8000], 8000, 4000);
        let (tx, rx) = crossbeam_channel::unbounded();
        let stream = source.start(tx).unwrap();

        let stamps: Vec<Duration> = rx
            .iter()
            .filter_map(|event| match event {
                CaptureEvent::Chunk { captured_at, .. } => Some(captured_at),
                CaptureEvent::Status(_) => None,
            })
            .collect();
        stream.stop();

        assert_eq!(stamps, vec![Duration::ZERO, Duration::from_millis(500)]);
    }

    #[test]
    fn test_int_full_scale_covers_32_bit() {
        assert_eq!(int_full_scale(8).unwrap(), 128.0);
        assert_eq!(int_full_scale(16).unwrap(), 32768.0);
        assert_eq!(int_full_scale(24).unwrap(), 8_388_608.0);
        assert_eq!(int_full_scale(32).unwrap(), 2_147_483_648.0);
        assert!(int_full_scale(0).is_err());
        assert!(int_full_scale(33).is_err());
    }
}
