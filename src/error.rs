//! Error types for the script sandbox.

use std::time::Duration;

use thiserror::Error;

use crate::interp::{Fault, FaultKind};

/// Errors that can occur while operating the sandbox.
///
/// Faults raised by sandboxed code never surface as `Err` from the execution
/// entry points; they are folded into the returned outcome. This enum covers
/// host-side operations (parsing scripts from disk, guarded calls, version
/// advisories) and the conversions the engine uses internally.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// The script failed to tokenize or parse.
    #[error("syntax error at line {line}: {message}")]
    Syntax {
        /// 1-based line reported by the parser.
        line: u32,
        message: String,
    },

    /// Valid script code raised during evaluation.
    #[error("runtime fault: {message}")]
    Runtime {
        /// Line of the deepest frame, when one was available.
        line: Option<u32>,
        message: String,
    },

    /// A script file was requested that does not exist.
    #[error("script file not found: {0}")]
    ScriptNotFound(String),

    /// A guarded call exceeded its configured timeout.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// A guarded call panicked.
    #[error("call panicked: {0}")]
    Panicked(String),

    /// A version requirement string could not be parsed.
    #[error("invalid version requirement '{0}'")]
    InvalidRequirement(String),

    /// A version string could not be parsed.
    #[error("invalid version string '{0}'")]
    InvalidVersion(String),

    /// I/O error while reading scripts or writing logs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SandboxError {
    /// Check if this error represents a syntax fault.
    pub fn is_syntax(&self) -> bool {
        matches!(self, SandboxError::Syntax { .. })
    }

    /// Check if this error represents a runtime fault.
    pub fn is_runtime(&self) -> bool {
        matches!(self, SandboxError::Runtime { .. })
    }

    /// Check if this error represents a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SandboxError::Timeout(_))
    }

    /// Check if this error represents a missing script file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SandboxError::ScriptNotFound(_))
    }

    /// The fault line, for syntax and runtime faults that carry one.
    pub fn line(&self) -> Option<u32> {
        match self {
            SandboxError::Syntax { line, .. } => Some(*line),
            SandboxError::Runtime { line, .. } => *line,
            _ => None,
        }
    }
}

impl From<Fault> for SandboxError {
    fn from(fault: Fault) -> Self {
        match fault.kind {
            FaultKind::Syntax => SandboxError::Syntax {
                line: fault.line.unwrap_or(0),
                message: fault.message,
            },
            FaultKind::Runtime => SandboxError::Runtime {
                line: fault.line,
                message: fault.message,
            },
        }
    }
}

/// Result type alias for sandbox operations.
pub type Result<T> = std::result::Result<T, SandboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_conversion_keeps_lines() {
        let err: SandboxError = Fault::syntax(3, "expected ')'").into();
        assert!(err.is_syntax());
        assert_eq!(err.line(), Some(3));

        let err: SandboxError = Fault::runtime("division by zero").with_line(7).into();
        assert!(err.is_runtime());
        assert_eq!(err.line(), Some(7));
    }

    #[test]
    fn error_helpers() {
        let timeout = SandboxError::Timeout(Duration::from_secs(2));
        assert!(timeout.is_timeout());
        assert!(!timeout.is_syntax());
        assert_eq!(timeout.line(), None);

        let missing = SandboxError::ScriptNotFound("demo.pys".to_string());
        assert!(missing.is_not_found());
    }

    #[test]
    fn display_formats() {
        let err = SandboxError::Syntax {
            line: 2,
            message: "unexpected end of line".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "syntax error at line 2: unexpected end of line"
        );
    }
}
