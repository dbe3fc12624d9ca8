//! Raw log line parsing and error classification
//!
//! Lines of the form `[<timestamp>] <LEVEL>: <message>` parse into their parts.
//! Anything else becomes a record with no timestamp, level `UNKNOWN` and the
//! whole line as message.

use crate::protocol::messages::LogRecord;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Level assigned to lines that do not match the log pattern
pub const UNKNOWN_LEVEL: &str = "UNKNOWN";

/// Substrings marking a line as an error, checked in this order
pub const ERROR_PATTERNS: [&str; 7] = [
    "ERROR",
    "FATAL",
    "CRITICAL",
    "Exception",
    "failed",
    "timeout",
    "refused",
];

static LOG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([^\]]+)\]\s+(\w+):\s+(.*)").expect("log line pattern is valid")
});

static ERROR_MATCHERS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    ERROR_PATTERNS
        .iter()
        .map(|pattern| {
            let matcher = RegexBuilder::new(&regex::escape(pattern))
                .case_insensitive(true)
                .build()
                .expect("escaped literal is a valid pattern");
            (*pattern, matcher)
        })
        .collect()
});

/// Parse one raw line into a [`LogRecord`]
pub fn parse_line(line: &str) -> LogRecord {
    match LOG_LINE.captures(line) {
        Some(caps) => LogRecord {
            timestamp: Some(caps[1].to_string()),
            level: caps[2].to_string(),
            message: caps[3].to_string(),
            raw: line.to_string(),
        },
        None => LogRecord {
            timestamp: None,
            level: UNKNOWN_LEVEL.to_string(),
            message: line.to_string(),
            raw: line.to_string(),
        },
    }
}

/// Parse every line, preserving order
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Vec<LogRecord> {
    lines.iter().map(|line| parse_line(line.as_ref())).collect()
}

/// First error pattern the line contains, case-insensitively
pub fn matching_error_pattern(line: &str) -> Option<&'static str> {
    ERROR_MATCHERS
        .iter()
        .find(|(_, matcher)| matcher.is_match(line))
        .map(|(pattern, _)| *pattern)
}

pub fn is_error_line(line: &str) -> bool {
    matching_error_pattern(line).is_some()
}
