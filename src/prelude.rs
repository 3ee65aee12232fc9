//! Prelude module for convenient imports.

pub use crate::error::{Result, SandboxError};
pub use crate::guard::{CallPolicy, CallReport};
pub use crate::ledger::{ExecutionRecord, Ledger, OperationKind, RunStatus};
pub use crate::logging::{EventLog, LogLevel};
pub use crate::sandbox::{
    config::SandboxConfig,
    executor::{ExecutionOutcome, Sandbox},
    scanner::{ScanFinding, ScanLayer},
};
