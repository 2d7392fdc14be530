//! Structured JSON logger
//!
//! One log line per event, synchronous, with deterministic key ordering.
//! `serde_json`'s default map is ordered by key, so rendering through it
//! keeps output stable for any field order at the call site. ERROR and
//! FATAL go to stderr, everything else to stdout.

use std::fmt;
use std::io::{self, Write};

use serde_json::{Map, Value};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Synchronous structured logger
pub struct Logger;

impl Logger {
    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }

    pub fn fatal(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, event, fields);
    }

    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let line = Self::render(severity, event, fields);
        if severity >= Severity::Error {
            let mut err = io::stderr();
            let _ = err.write_all(line.as_bytes());
            let _ = err.flush();
        } else {
            let mut out = io::stdout();
            let _ = out.write_all(line.as_bytes());
            let _ = out.flush();
        }
    }

    fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut map = Map::new();
        map.insert("event".into(), Value::String(event.to_string()));
        map.insert("severity".into(), Value::String(severity.as_str().to_string()));
        for (key, value) in fields {
            map.insert((*key).to_string(), Value::String((*value).to_string()));
        }

        let mut line = Value::Object(map).to_string();
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_render_is_valid_json() {
        let line = Logger::render(Severity::Info, "request_handled", &[("status", "200")]);

        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "request_handled");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["status"], "200");
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_field_order_does_not_change_output() {
        let a = Logger::render(Severity::Info, "e", &[("zebra", "1"), ("apple", "2")]);
        let b = Logger::render(Severity::Info, "e", &[("apple", "2"), ("zebra", "1")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_special_characters_escaped() {
        let line = Logger::render(Severity::Error, "fault", &[("detail", "a \"b\"\nline")]);

        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["detail"], "a \"b\"\nline");
        // The newline in the value is escaped; only the terminator remains.
        assert_eq!(line.matches('\n').count(), 1);
    }
}
