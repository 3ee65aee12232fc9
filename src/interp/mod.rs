//! Minimal interpreter for a small Python-like script language.
//!
//! This is the execution substrate the sandbox engine runs code on: a lexer,
//! a recursive-descent parser and a tree-walking evaluator. The evaluator
//! only reaches names present in the injected [`BuiltinTable`], exposes every
//! top-level binding back to the caller, and reports faults with the 1-based
//! line of the deepest node that raised them.

pub mod ast;
pub mod builtins;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

pub use builtins::{BuiltinTable, RESTRICTED_NAMES};
pub use eval::{Limits, Machine};
pub use parser::parse;
pub use value::{Bindings, FunctionDef, Value};

use std::fmt;

/// What kind of fault interrupted lexing, parsing or evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The source failed to tokenize or parse.
    Syntax,
    /// Valid code raised during evaluation.
    Runtime,
}

/// A fault raised by the interpreter, carrying the source line when known.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub kind: FaultKind,
    /// 1-based source line; `None` when no frame was available.
    pub line: Option<u32>,
    pub message: String,
}

impl Fault {
    pub fn syntax(line: u32, message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Syntax,
            line: Some(line),
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Runtime,
            line: None,
            message: message.into(),
        }
    }

    /// Attach a line if none was recorded yet. Inner (deeper) frames attach
    /// first, so the first line to stick is the deepest one.
    pub fn with_line(mut self, line: u32) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        self
    }

    pub fn is_syntax(&self) -> bool {
        self.kind == FaultKind::Syntax
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for Fault {}
