//! Leaf utilities shared by the processing agents
//!
//! - `stats`: numeric summarization and KPI formulas (the KPI agent's engine)
//! - `log_parser`: log line parsing and error classification (the logs agent's engine)
//! - `frequency`: order-preserving frequency counting for pattern analysis

pub mod frequency;
pub mod log_parser;
pub mod stats;

pub use frequency::FrequencyCounter;
pub use log_parser::{is_error_line, parse_line, parse_lines, ERROR_PATTERNS, UNKNOWN_LEVEL};
pub use stats::{round2, summarize, Summary};
