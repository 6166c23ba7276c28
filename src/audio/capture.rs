use std::time::Instant;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;

use super::source::{CaptureEvent, CaptureSource, CaptureStream};
use crate::config::AudioConfig;
use crate::error::{FilterError, Result};

/// Running input stream on the default capture device
pub struct AudioCapture {
    stream: cpal::Stream,
}

impl AudioCapture {
    /// Open the default input device and start delivering mono chunks
    ///
    /// Only channel 0 is forwarded when the device is opened with more
    /// than one channel.
    pub fn new(config: &AudioConfig, tx: Sender<CaptureEvent>) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| FilterError::AudioDevice("No input device found".into()))?;

        match device.description() {
            Ok(desc) => log::info!("Input device: {:?}", desc),
            Err(_) => log::info!("Input device: Unknown"),
        }

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size as u32),
        };

        let channels = config.channels.max(1) as usize;
        let started = Instant::now();
        let status_tx = tx.clone();

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let samples = if channels == 1 {
                        data.to_vec()
                    } else {
                        data.iter().step_by(channels).copied().collect()
                    };
                    if tx.send(CaptureEvent::chunk(samples, started.elapsed())).is_err() {
                        log::warn!("Audio receiver dropped");
                    }
                },
                move |err| {
                    let _ = status_tx.send(CaptureEvent::Status(err.to_string()));
                },
                None,
            )
            .map_err(|e| FilterError::AudioStream(format!("{}", e)))?;

        stream
            .play()
            .map_err(|e| FilterError::AudioStream(format!("{}", e)))?;

        Ok(Self { stream })
    }
}

impl CaptureStream for AudioCapture {
    fn stop(self: Box<Self>) {
        if let Err(e) = self.stream.pause() {
            log::warn!("Failed to pause input stream: {}", e);
        }
        // Dropping the stream drops both callbacks and their senders.
        drop(self);
    }
}

/// Capture source backed by the default input device
pub struct DeviceSource {
    config: AudioConfig,
}

impl DeviceSource {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl CaptureSource for DeviceSource {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn realtime_buffer_frames(&self) -> Option<u32> {
        Some(self.config.buffer_size as u32)
    }

    fn start(&mut self, tx: Sender<CaptureEvent>) -> Result<Box<dyn CaptureStream>> {
        Ok(Box::new(AudioCapture::new(&self.config, tx)?))
    }
}
