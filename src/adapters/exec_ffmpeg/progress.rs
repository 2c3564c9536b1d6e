//! Incremental parser for the transcoder's diagnostic stream
//!
//! The transcoder rewrites its status line in place with carriage returns,
//! so the stream is split on both `\r` and `\n`. Bytes are buffered until a
//! separator arrives, which makes the parser independent of how the stream
//! was chunked by the pipe.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::model::EncodeProgress;
use crate::utils::time::parse_clock;

static PROGRESS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"fps=\s*(\d+(?:\.\d+)?)\s+q=.*?time=\s*(-?\d+:\d+:\d+(?:\.\d+)?)\s+bitrate")
        .expect("static regex failed")
});

/// Parse one status line into a progress snapshot normalized by `expected_duration`
pub fn parse_progress_line(line: &str, expected_duration: f64) -> Option<EncodeProgress> {
    let captures = PROGRESS_LINE.captures(line)?;
    let fps: f64 = captures.get(1)?.as_str().parse().ok()?;
    let time = parse_clock(captures.get(2)?.as_str())?;
    let percent = time * 100.0 / expected_duration;
    Some(EncodeProgress::new(percent as i64, fps as u32))
}

/// Stateful line splitter and progress extractor
#[derive(Debug)]
pub struct ProgressParser {
    expected_duration: f64,
    pending: Vec<u8>,
    last_diagnostic: Option<String>,
}

impl ProgressParser {
    pub fn new(expected_duration: f64) -> Self {
        Self {
            expected_duration,
            pending: Vec::new(),
            last_diagnostic: None,
        }
    }

    /// Consume a chunk of raw output, returning the progress of every
    /// complete line it finished
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<EncodeProgress> {
        let mut reports = Vec::new();
        for &byte in bytes {
            if byte == b'\r' || byte == b'\n' {
                let line = std::mem::take(&mut self.pending);
                reports.extend(self.consume_line(&line));
            } else {
                self.pending.push(byte);
            }
        }
        reports
    }

    /// Flush a trailing line that was not terminated by a separator
    pub fn finish(&mut self) -> Vec<EncodeProgress> {
        let line = std::mem::take(&mut self.pending);
        self.consume_line(&line).into_iter().collect()
    }

    /// Last non-progress line seen, used as the failure reason
    pub fn last_diagnostic(&self) -> Option<&str> {
        self.last_diagnostic.as_deref()
    }

    fn consume_line(&mut self, raw: &[u8]) -> Option<EncodeProgress> {
        let decoded = String::from_utf8_lossy(raw);
        let line = decoded.trim();
        if line.is_empty() {
            return None;
        }
        match parse_progress_line(line, self.expected_duration) {
            Some(progress) => Some(progress),
            None => {
                self.last_diagnostic = Some(line.to_string());
                None
            }
        }
    }
}
