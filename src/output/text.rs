use super::{Formatter, RecordingSummary};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, summary: &RecordingSummary) -> String {
        let mut out = format!(
            "Recorded {} samples ({:.2}s at {} Hz), band {:.0}-{:.0} Hz, gain {:.1} dB",
            summary.samples,
            summary.duration_secs,
            summary.sample_rate,
            summary.highpass_hz,
            summary.lowpass_hz,
            summary.gain_db
        );
        if self.verbose {
            out.push_str(&format!(
                "\n  started: {}\n  wall time: {:.2}s\n  original: rms {:.4}, peak {:.4}\n  filtered: rms {:.4}, peak {:.4}",
                summary.started_at,
                summary.elapsed_secs,
                summary.input_rms,
                summary.input_peak,
                summary.output_rms,
                summary.output_peak
            ));
        }
        out
    }
}
