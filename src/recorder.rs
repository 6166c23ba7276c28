//! Recording lifecycle: capture, stop barrier, and the filter pass.
//!
//! ```text
//! Idle ──start──▶ Recording ──stop──▶ Stopped ──start──▶ Recording ...
//! ```
//!
//! While recording, a dedicated capture thread drains `CaptureEvent`s from
//! the source and appends chunks to a shared `CaptureBuffer`. `stop` halts
//! the source, waits for the channel to disconnect and joins the capture
//! thread before the chunks are concatenated, so the raw buffer is only
//! ever read after the last delivery has landed.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam_channel::Receiver;

use crate::audio::{CaptureEvent, CaptureSource, CaptureStream};
use crate::config::FilterConfig;
use crate::error::{FilterError, Result};
use crate::output::RecordingSummary;
use crate::signal_processing::{CutoffControl, Cutoffs, FilterEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopped,
}

#[derive(Default)]
struct CaptureInner {
    accepting: bool,
    chunks: Vec<Vec<f32>>,
    frames: usize,
}

/// Append-only chunk log shared with the capture thread
///
/// The lock is held only for a `Vec::push`.
#[derive(Default)]
pub struct CaptureBuffer {
    inner: Mutex<CaptureInner>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CaptureInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Discard previous chunks and accept new ones
    pub fn open(&self) {
        let mut inner = self.lock();
        inner.chunks.clear();
        inner.frames = 0;
        inner.accepting = true;
    }

    /// Append a chunk; returns false (and drops it) when closed
    pub fn push_chunk(&self, chunk: Vec<f32>) -> bool {
        let mut inner = self.lock();
        if !inner.accepting {
            return false;
        }
        inner.frames += chunk.len();
        inner.chunks.push(chunk);
        true
    }

    pub fn frames(&self) -> usize {
        self.lock().frames
    }

    pub fn is_accepting(&self) -> bool {
        self.lock().accepting
    }

    /// Stop accepting and concatenate everything captured so far
    pub fn close(&self) -> Vec<f32> {
        let (chunks, frames) = {
            let mut inner = self.lock();
            inner.accepting = false;
            let frames = std::mem::take(&mut inner.frames);
            (std::mem::take(&mut inner.chunks), frames)
        };

        let mut samples = Vec::with_capacity(frames);
        for chunk in chunks {
            samples.extend_from_slice(&chunk);
        }
        samples
    }
}

struct Session {
    stream: Box<dyn CaptureStream>,
    worker: thread::JoinHandle<()>,
}

impl Session {
    /// Stop the source, then wait for the capture thread to drain and exit
    fn finish(self) {
        self.stream.stop();
        if self.worker.join().is_err() {
            log::error!("Capture thread panicked");
        }
    }
}

/// Records from a capture source and filters each finished recording
pub struct Recorder {
    source: Box<dyn CaptureSource>,
    engine: FilterEngine,
    buffer: Arc<CaptureBuffer>,
    state: RecorderState,
    session: Option<Session>,
    started: Option<Instant>,
    started_at: Option<DateTime<Utc>>,
    elapsed: Duration,
    raw: Option<Vec<f32>>,
    filtered: Option<Vec<f32>>,
    applied: Option<Cutoffs>,
}

impl Recorder {
    /// Create a recorder whose cutoffs start from `filter`
    pub fn new(source: Box<dyn CaptureSource>, filter: &FilterConfig) -> Self {
        let sample_rate = source.sample_rate();
        let cutoffs = Arc::new(filter.cutoff_control(sample_rate));
        Self::with_cutoffs(source, cutoffs, filter.amplitude)
    }

    /// Create a recorder sharing an existing cutoff control
    pub fn with_cutoffs(
        source: Box<dyn CaptureSource>,
        cutoffs: Arc<CutoffControl>,
        amplitude: f32,
    ) -> Self {
        let engine = FilterEngine::new(source.sample_rate() as f32, amplitude, cutoffs);
        Self {
            source,
            engine,
            buffer: Arc::new(CaptureBuffer::new()),
            state: RecorderState::Idle,
            session: None,
            started: None,
            started_at: None,
            elapsed: Duration::ZERO,
            raw: None,
            filtered: None,
            applied: None,
        }
    }

    /// Begin a new recording, discarding the previous one
    pub fn start(&mut self) -> Result<()> {
        if self.state == RecorderState::Recording {
            return Err(FilterError::AlreadyRecording);
        }

        self.buffer.open();

        let (tx, rx) = crossbeam_channel::unbounded();
        let buffer = Arc::clone(&self.buffer);
        let realtime = self
            .source
            .realtime_buffer_frames()
            .map(|frames| (frames, self.source.sample_rate()));
        let worker = thread::Builder::new()
            .name("capture".into())
            .spawn(move || run_capture(rx, &buffer, realtime))?;

        let stream = match self.source.start(tx) {
            Ok(stream) => stream,
            Err(e) => {
                // The sender went down with the failed start, so the worker exits.
                let _ = worker.join();
                self.buffer.close();
                return Err(e);
            }
        };

        self.raw = None;
        self.filtered = None;
        self.applied = None;
        self.elapsed = Duration::ZERO;
        self.session = Some(Session { stream, worker });
        self.started = Some(Instant::now());
        self.started_at = Some(Utc::now());
        self.state = RecorderState::Recording;
        log::info!("Recording started at {} Hz", self.sample_rate());
        Ok(())
    }

    /// Append a chunk directly; ignored unless recording
    pub fn push_chunk(&self, chunk: &[f32]) -> bool {
        self.buffer.push_chunk(chunk.to_vec())
    }

    /// Finish the recording and run the filter over it
    ///
    /// Returns `NoAudioRecorded` without filtering when nothing was
    /// captured; the filtered buffer then stays unset.
    pub fn stop(&mut self) -> Result<()> {
        if self.state != RecorderState::Recording {
            return Err(FilterError::NotRecording);
        }

        if let Some(session) = self.session.take() {
            session.finish();
        }
        self.elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        self.state = RecorderState::Stopped;

        let raw = self.buffer.close();
        log::info!(
            "Recording stopped: {} samples ({:.2}s)",
            raw.len(),
            raw.len() as f32 / self.sample_rate() as f32
        );

        if raw.is_empty() {
            log::warn!("No audio captured");
            self.raw = Some(raw);
            return Err(FilterError::NoAudioRecorded);
        }

        let (filtered, cutoffs) = self.engine.process(&raw);
        debug_assert_eq!(filtered.len(), raw.len());
        self.raw = Some(raw);
        self.filtered = Some(filtered);
        self.applied = Some(cutoffs);
        Ok(())
    }

    /// Filter the finished recording again with the current cutoffs
    pub fn refilter(&mut self) -> Result<()> {
        if self.state == RecorderState::Recording {
            return Err(FilterError::AlreadyRecording);
        }
        let raw = self.raw_samples()?;
        let (filtered, cutoffs) = self.engine.process(raw);
        self.filtered = Some(filtered);
        self.applied = Some(cutoffs);
        Ok(())
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Time since `start`, frozen once stopped
    pub fn elapsed(&self) -> Duration {
        match (self.state, self.started) {
            (RecorderState::Recording, Some(started)) => started.elapsed(),
            _ => self.elapsed,
        }
    }

    /// Frames captured so far in the current recording
    pub fn captured_frames(&self) -> usize {
        match self.state {
            RecorderState::Recording => self.buffer.frames(),
            _ => self.raw.as_ref().map_or(0, Vec::len),
        }
    }

    pub fn raw_samples(&self) -> Result<&[f32]> {
        match &self.raw {
            Some(raw) if !raw.is_empty() => Ok(raw),
            _ => Err(FilterError::NoAudioRecorded),
        }
    }

    pub fn filtered_samples(&self) -> Result<&[f32]> {
        self.filtered
            .as_deref()
            .ok_or(FilterError::NoAudioRecorded)
    }

    /// Cutoffs used for the current filtered buffer
    pub fn applied_cutoffs(&self) -> Option<Cutoffs> {
        self.applied
    }

    pub fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Cutoff control shared with the presentation layer
    pub fn cutoffs(&self) -> &Arc<CutoffControl> {
        self.engine.cutoffs()
    }

    pub fn summary(&self) -> Result<RecordingSummary> {
        let raw = self.raw_samples()?;
        let filtered = self.filtered_samples()?;
        let cutoffs = self.applied.unwrap_or_else(|| self.cutoffs().snapshot());
        Ok(RecordingSummary::new(
            self.started_at.unwrap_or_else(Utc::now),
            self.sample_rate(),
            self.elapsed,
            cutoffs,
            raw,
            filtered,
        ))
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.finish();
            self.buffer.close();
        }
    }
}

fn run_capture(rx: Receiver<CaptureEvent>, buffer: &CaptureBuffer, realtime: Option<(u32, u32)>) {
    let rt_handle = realtime.and_then(|(frames, sample_rate)| {
        match audio_thread_priority::promote_current_thread_to_real_time(frames, sample_rate) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Could not set real-time priority: {}", e);
                None
            }
        }
    });

    for event in rx.iter() {
        match event {
            CaptureEvent::Chunk {
                samples,
                frames,
                captured_at,
            } => {
                log::trace!("Chunk of {} frames at {:?}", frames, captured_at);
                buffer.push_chunk(samples);
            }
            CaptureEvent::Status(status) => log::warn!("Capture status: {}", status),
        }
    }

    if let Some(handle) = rt_handle {
        if let Err(e) = audio_thread_priority::demote_current_thread_from_real_time(handle) {
            log::debug!("Could not restore thread priority: {}", e);
        }
    }
}
