mod json;
mod text;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::signal_processing::Cutoffs;
use crate::signal_processing::math::{gain_db, peak, rms};

pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Levels and settings of one finished recording
#[derive(Debug, Clone, Serialize)]
pub struct RecordingSummary {
    pub started_at: String,
    pub sample_rate: u32,
    pub samples: usize,
    pub duration_secs: f32,
    pub elapsed_secs: f32,
    pub highpass_hz: f32,
    pub lowpass_hz: f32,
    pub input_rms: f32,
    pub input_peak: f32,
    pub output_rms: f32,
    pub output_peak: f32,
    pub gain_db: f32,
}

impl RecordingSummary {
    pub fn new(
        started_at: DateTime<Utc>,
        sample_rate: u32,
        elapsed: Duration,
        cutoffs: Cutoffs,
        raw: &[f32],
        filtered: &[f32],
    ) -> Self {
        let input_rms = rms(raw);
        let output_rms = rms(filtered);
        Self {
            started_at: iso8601(&started_at),
            sample_rate,
            samples: raw.len(),
            duration_secs: raw.len() as f32 / sample_rate as f32,
            elapsed_secs: elapsed.as_secs_f32(),
            highpass_hz: cutoffs.highpass_hz,
            lowpass_hz: cutoffs.lowpass_hz,
            input_rms,
            input_peak: peak(raw),
            output_rms,
            output_peak: peak(filtered),
            gain_db: gain_db(output_rms, input_rms),
        }
    }
}

pub trait Formatter: Send {
    fn format(&self, summary: &RecordingSummary) -> String;
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

pub fn iso8601(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
pub(crate) fn sample_summary() -> RecordingSummary {
    let started_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
    RecordingSummary::new(
        started_at,
        44100,
        Duration::from_millis(1500),
        Cutoffs::new(200.0, 1000.0),
        &[0.5, -0.5, 0.5, -0.5],
        &[0.25, -0.25, 0.25, -0.25],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_levels() {
        let summary = sample_summary();
        assert_eq!(summary.samples, 4);
        assert_eq!(summary.input_peak, 0.5);
        assert_eq!(summary.output_rms, 0.25);
        assert!((summary.gain_db + 6.0206).abs() < 0.01);
        assert_eq!(summary.started_at, "2023-11-14T22:13:20.000Z");
    }
}
