//! Line-by-line consumption of script output.
//!
//! Every line is counted. Lines of the form `::{"outputs": {...}}::` carry
//! output variables and are not forwarded to the log queue; all other lines
//! are, stdout at INFO and stderr at WARN.

use serde::Deserialize;
use serde_json::{Map, Value};

use scriptrun_events::LogLevel;

use super::context::RunLogger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    StdOut,
    StdErr,
}

impl StreamKind {
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::StdOut => LogLevel::Info,
            Self::StdErr => LogLevel::Warn,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ControlMessage {
    #[serde(default)]
    outputs: Map<String, Value>,
}

/// Output variables of a `::{...}::` control line, or `None` for a regular line.
pub fn parse_control_line(line: &str) -> Option<Map<String, Value>> {
    let inner = line.trim().strip_prefix("::")?.strip_suffix("::")?;
    if !inner.starts_with('{') {
        return None;
    }
    serde_json::from_str::<ControlMessage>(inner)
        .ok()
        .map(|msg| msg.outputs)
}

/// Running totals for one stream.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StreamSummary {
    pub line_count: u64,
    pub vars: Map<String, Value>,
}

impl StreamSummary {
    pub fn accept(&mut self, line: &str, stream: StreamKind, logger: &RunLogger) {
        self.line_count += 1;
        match parse_control_line(line) {
            Some(outputs) => self.vars.extend(outputs),
            None => logger.log(stream.log_level(), line),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
