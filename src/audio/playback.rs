use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{RecvTimeoutError, bounded};

use crate::error::{FilterError, Result};

/// Asynchronous playback of a finished buffer
pub trait PlaybackSink {
    /// Start playing `buffer` at `sample_rate` and return immediately
    fn play(&self, buffer: &[f32], sample_rate: u32) -> Result<()>;
}

/// Plays mono buffers on the default output device
///
/// Each request runs on its own thread. A new request interrupts the one
/// still playing.
#[derive(Default)]
pub struct DevicePlayback {
    current: Mutex<Option<Arc<AtomicBool>>>,
}

impl DevicePlayback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrupt whatever is playing
    pub fn stop(&self) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cancel) = current.take() {
            cancel.store(true, Ordering::Release);
        }
    }
}

impl PlaybackSink for DevicePlayback {
    fn play(&self, buffer: &[f32], sample_rate: u32) -> Result<()> {
        if buffer.is_empty() {
            return Err(FilterError::NoAudioRecorded);
        }

        let cancel = Arc::new(AtomicBool::new(false));
        {
            let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(previous) = current.replace(Arc::clone(&cancel)) {
                previous.store(true, Ordering::Release);
            }
        }

        let samples = buffer.to_vec();
        thread::Builder::new()
            .name("playback".into())
            .spawn(move || {
                if let Err(e) = play_blocking(samples, sample_rate, &cancel) {
                    log::error!("Playback failed: {}", e);
                }
            })?;
        Ok(())
    }
}

fn play_blocking(samples: Vec<f32>, sample_rate: u32, cancel: &AtomicBool) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| FilterError::AudioDevice("No output device found".into()))?;

    let channels = device
        .default_output_config()
        .map_err(|e| FilterError::AudioDevice(format!("{}", e)))?
        .channels();

    let stream_config = cpal::StreamConfig {
        channels,
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    let total = samples.len();
    let duration_secs = total as f32 / sample_rate as f32;
    let (done_tx, done_rx) = bounded(1);
    let mut position = 0;

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels as usize) {
                    let sample = samples.get(position).copied().unwrap_or(0.0);
                    frame.fill(sample);
                    position = (position + 1).min(total);
                }
                if position >= total {
                    let _ = done_tx.try_send(());
                }
            },
            |err| log::error!("Playback stream error: {}", err),
            None,
        )
        .map_err(|e| FilterError::AudioStream(format!("{}", e)))?;

    stream
        .play()
        .map_err(|e| FilterError::AudioStream(format!("{}", e)))?;
    log::info!("Playing {} samples ({:.1}s) at {} Hz", total, duration_secs, sample_rate);

    loop {
        match done_rx.recv_timeout(Duration::from_millis(20)) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if cancel.load(Ordering::Acquire) {
                    log::debug!("Playback interrupted");
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_is_refused() {
        let playback = DevicePlayback::new();
        assert!(matches!(
            playback.play(&[], 44100),
            Err(FilterError::NoAudioRecorded)
        ));
    }
}
