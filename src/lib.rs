//! # Script Sandbox
//!
//! Defensive script execution with layered security scanning.
//!
//! This crate runs snippets of a small Python-like script language under a
//! best-effort sandbox: a restricted builtin allowlist, static pattern
//! scanning, runtime call tracing and post-execution output inspection,
//! with every attempt recorded in an append-only ledger. Faults raised by
//! sandboxed code never escape the execution entry points; each run folds
//! into an outcome carrying success, the produced namespace and any error.
//!
//! ## Example
//!
//! ```rust
//! use script_sandbox_rs::prelude::*;
//! use script_sandbox_rs::interp::Value;
//!
//! let mut sandbox = Sandbox::new(SandboxConfig::silent());
//! let outcome = sandbox.execute_with_scanning("result = (10+20)*2", None);
//!
//! assert!(outcome.success);
//! assert_eq!(outcome.namespace.get("result"), Some(&Value::Int(60)));
//! assert!(outcome.findings.is_empty());
//! ```
//!
//! ## Security Model
//!
//! The sandbox layers several best-effort passes around one execution:
//!
//! 1. **Static pattern scan**: encoding/dynamic-execution calls, dunder
//!    density and escape-sequence obfuscation in the source text
//! 2. **Restricted builtins**: executed code only reaches allowlisted names
//! 3. **Behavioral call tracing**: function-entry names matched against
//!    file/network/introspection keywords
//! 4. **Output inspection**: size and secret-pattern checks over the
//!    resulting namespace
//!
//! All detection is advisory. This is NOT a real sandbox: there is no
//! memory, CPU or syscall isolation, and blocking is trivially bypassable
//! by a determined author. It exists to keep accidents and casual misuse
//! from terminating or polluting a host process.

pub mod advisory;
pub mod error;
pub mod guard;
pub mod interp;
pub mod ledger;
pub mod loader;
pub mod logging;
pub mod prelude;
pub mod sandbox;

// Re-export main types at crate root for convenience
pub use error::{Result, SandboxError};
pub use guard::{safe_run, CallPolicy, CallReport};
pub use ledger::{ExecutionRecord, Ledger, OperationKind, RunStatus};
pub use loader::{quick_load, ScriptModule};
pub use logging::{EventLog, LogLevel};
pub use sandbox::cache::{global_cache, ScriptCache};
pub use sandbox::config::{SandboxConfig, SandboxConfigBuilder};
pub use sandbox::executor::{ExecutionOutcome, Sandbox};
pub use sandbox::scanner::{ScanFinding, ScanLayer};
