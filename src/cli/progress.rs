//! Progress rendering for the terminal

use std::io::Write;
use std::sync::Arc;

use crate::cli::args::ProgressFormat;
use crate::domain::model::{EncodeProgress, UploadProgress};
use crate::ports::{NoProgress, ProgressSink, SharedSink};

const BAR_WIDTH: usize = 30;

/// Render a percentage as a fixed-width bar
pub fn bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Human readable transfer rate
pub fn format_rate(bits_per_second: u64) -> String {
    const UNITS: [&str; 4] = ["bit/s", "kbit/s", "Mbit/s", "Gbit/s"];
    let mut value = bits_per_second as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bits_per_second, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Single-line progress bar rewritten in place on stderr
pub struct ConsoleProgress;

impl ConsoleProgress {
    fn draw(line: String) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}", line);
        let _ = stderr.flush();
    }

    /// Terminate the progress line
    pub fn finish() {
        eprintln!();
    }
}

impl ProgressSink<EncodeProgress> for ConsoleProgress {
    fn report(&self, progress: EncodeProgress) {
        Self::draw(format!(
            "Encoding  {} {:>3}% {:>4} fps   ",
            bar(progress.percent_complete),
            progress.percent_complete,
            progress.frames_per_second
        ));
    }
}

impl ProgressSink<UploadProgress> for ConsoleProgress {
    fn report(&self, progress: UploadProgress) {
        Self::draw(format!(
            "Uploading {} {:>3}% {:>12}   ",
            bar(progress.percent_complete),
            progress.percent_complete,
            format_rate(progress.bits_per_second)
        ));
    }
}

/// One JSON object per line on stderr
pub struct JsonProgress;

impl JsonProgress {
    pub fn event(name: &str, fields: serde_json::Value) -> serde_json::Value {
        let mut event = serde_json::json!({
            "event": name,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let (Some(target), serde_json::Value::Object(extra)) = (event.as_object_mut(), fields) {
            target.extend(extra);
        }
        event
    }
}

impl ProgressSink<EncodeProgress> for JsonProgress {
    fn report(&self, progress: EncodeProgress) {
        let event = Self::event(
            "encode_progress",
            serde_json::json!({
                "percent": progress.percent_complete,
                "fps": progress.frames_per_second,
            }),
        );
        eprintln!("{}", event);
    }
}

impl ProgressSink<UploadProgress> for JsonProgress {
    fn report(&self, progress: UploadProgress) {
        let event = Self::event(
            "upload_progress",
            serde_json::json!({
                "percent": progress.percent_complete,
                "bits_per_second": progress.bits_per_second,
            }),
        );
        eprintln!("{}", event);
    }
}

/// Encode and upload sinks for the chosen format
pub fn sinks(format: ProgressFormat) -> (SharedSink<EncodeProgress>, SharedSink<UploadProgress>) {
    fn pair<S>(sink: S) -> (SharedSink<EncodeProgress>, SharedSink<UploadProgress>)
    where
        S: ProgressSink<EncodeProgress> + ProgressSink<UploadProgress> + 'static,
    {
        let sink = Arc::new(sink);
        let encode: SharedSink<EncodeProgress> = sink.clone();
        let upload: SharedSink<UploadProgress> = sink;
        (encode, upload)
    }

    match format {
        ProgressFormat::Plain => pair(ConsoleProgress),
        ProgressFormat::Json => pair(JsonProgress),
        ProgressFormat::Quiet => pair(NoProgress),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar() {
        assert_eq!(bar(0), format!("[{}]", "-".repeat(BAR_WIDTH)));
        assert_eq!(bar(100), format!("[{}]", "#".repeat(BAR_WIDTH)));
        assert_eq!(bar(50).matches('#').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0), "0 bit/s");
        assert_eq!(format_rate(999), "999 bit/s");
        assert_eq!(format_rate(1_500), "1.5 kbit/s");
        assert_eq!(format_rate(12_300_000), "12.3 Mbit/s");
    }

    #[test]
    fn test_json_event_has_timestamp_and_fields() {
        let event = JsonProgress::event("encode_progress", serde_json::json!({"percent": 42}));
        assert_eq!(event["event"], "encode_progress");
        assert_eq!(event["percent"], 42);
        assert!(chrono::DateTime::parse_from_rfc3339(event["timestamp"].as_str().unwrap()).is_ok());
    }
}
