use super::{Formatter, RecordingSummary};

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, summary: &RecordingSummary) -> String {
        serde_json::to_string(summary).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
    }
}
