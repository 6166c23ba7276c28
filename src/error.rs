use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Recording already in progress")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("No audio recorded yet.")]
    NoAudioRecorded,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FilterError>;
