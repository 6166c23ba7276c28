pub mod audio;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod recorder;
pub mod signal_processing;
pub mod wav;

pub use config::AppConfig;
pub use error::{FilterError, Result};
pub use recorder::{Recorder, RecorderState};
pub use signal_processing::{Cutoffs, filter};
pub use wav::save_wav;
