use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Sender, TryRecvError};
use micfilter::audio::{CaptureEvent, CaptureSource, CaptureStream};
use micfilter::{FilterError, Result};

/// Delivers a fixed list of events, then optionally stays open until stopped
pub struct ScriptedSource {
    events: Vec<CaptureEvent>,
    sample_rate: u32,
    hold_open: bool,
    starts_left: Option<usize>,
}

impl ScriptedSource {
    pub fn new(events: Vec<CaptureEvent>, sample_rate: u32) -> Self {
        Self {
            events,
            sample_rate,
            hold_open: false,
            starts_left: None,
        }
    }

    /// Keep the stream alive after the script until `stop`
    pub fn held_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Refuse to start once `starts` streams have been opened
    pub fn failing_after(mut self, starts: usize) -> Self {
        self.starts_left = Some(starts);
        self
    }
}

struct ThreadStream {
    stop_tx: Sender<()>,
    handle: thread::JoinHandle<()>,
}

impl CaptureStream for ThreadStream {
    fn stop(self: Box<Self>) {
        drop(self.stop_tx);
        self.handle.join().expect("source thread panicked");
    }
}

impl CaptureSource for ScriptedSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, tx: Sender<CaptureEvent>) -> Result<Box<dyn CaptureStream>> {
        if let Some(left) = self.starts_left.as_mut() {
            if *left == 0 {
                return Err(FilterError::AudioDevice("input device unplugged".into()));
            }
            *left -= 1;
        }
        let events = self.events.clone();
        let hold_open = self.hold_open;
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);

        let handle = thread::spawn(move || {
            for event in events {
                if tx.send(event).is_err() {
                    return;
                }
            }
            if hold_open {
                let _ = stop_rx.recv();
            }
        });

        Ok(Box::new(ThreadStream { stop_tx, handle }))
    }
}

/// Live-style source: sends ascending sample values until stopped
///
/// `sent` counts every frame handed to the channel.
pub struct CountingSource {
    chunk_size: usize,
    sample_rate: u32,
    pub sent: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(chunk_size: usize, sample_rate: u32) -> Self {
        Self {
            chunk_size,
            sample_rate,
            sent: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl CaptureSource for CountingSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, tx: Sender<CaptureEvent>) -> Result<Box<dyn CaptureStream>> {
        let chunk_size = self.chunk_size;
        let sent = Arc::clone(&self.sent);
        sent.store(0, Ordering::SeqCst);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);

        let handle = thread::spawn(move || {
            let mut next = 0usize;
            while let Err(TryRecvError::Empty) = stop_rx.try_recv() {
                let chunk: Vec<f32> = (next..next + chunk_size).map(|v| v as f32).collect();
                if tx.send(CaptureEvent::chunk(chunk, Duration::ZERO)).is_err() {
                    return;
                }
                next += chunk_size;
                sent.store(next, Ordering::SeqCst);
                thread::sleep(Duration::from_micros(200));
            }
        });

        Ok(Box::new(ThreadStream { stop_tx, handle }))
    }
}
