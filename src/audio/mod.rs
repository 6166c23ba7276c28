pub mod capture;
pub mod playback;
pub mod source;

pub use capture::{AudioCapture, DeviceSource};
pub use playback::{DevicePlayback, PlaybackSink};
pub use source::{BufferSource, CaptureEvent, CaptureSource, CaptureStream};
