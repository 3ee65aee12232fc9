//! Leveled event log: the sink every execution reports findings and
//! outcomes to.
//!
//! Messages go to the console when verbose and, optionally, to an
//! append-only log file, one line per message:
//!
//! ```text
//! [2026-08-07 14:02:11] [SECURITY] Obfuscation warning: ...
//! ```
//!
//! Nothing in the engine depends on delivery succeeding; a log file that
//! cannot be written is warned about on stderr and otherwise ignored.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

/// Severity attached to a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Error,
    Warning,
    Security,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Security => "SECURITY",
        };
        write!(f, "{}", label)
    }
}

/// Console-and-file message sink.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    verbose: bool,
    log_file: Option<PathBuf>,
}

impl EventLog {
    pub fn new(verbose: bool, log_file: Option<PathBuf>) -> Self {
        Self { verbose, log_file }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Record one message at the given level.
    pub fn log(&self, level: LogLevel, message: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let entry = format!("[{}] [{}] {}", timestamp, level, message);

        if self.verbose {
            println!("{}", entry);
        }

        if let Some(path) = &self.log_file {
            if let Err(e) = append_line(path, &entry) {
                eprintln!("Warning: could not write to log file: {}", e);
            }
        }
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Success, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn security(&self, message: &str) {
        self.log(LogLevel::Security, message);
    }
}

fn append_line(path: &Path, entry: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_render_upper_case() {
        assert_eq!(LogLevel::Info.to_string(), "INFO");
        assert_eq!(LogLevel::Security.to_string(), "SECURITY");
    }

    #[test]
    fn file_sink_appends_one_line_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let log = EventLog::new(false, Some(path.clone()));

        log.info("first");
        log.security("second");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[INFO] first"));
        assert!(lines[1].contains("[SECURITY] second"));
    }

    #[test]
    fn unwritable_file_is_not_fatal() {
        let log = EventLog::new(false, Some(PathBuf::from("/no/such/dir/events.log")));
        log.error("still fine");
    }
}
