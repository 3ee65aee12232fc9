//! Append-only record of every execution attempt.
//!
//! Entries from different entry points carry different optional fields
//! (sandbox runs have a blocked-line location, guarded calls do not); the
//! summary report tolerates every shape and preserves recording order.

use std::fmt;

use chrono::{DateTime, Local};

/// What kind of operation produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    ModuleLoad,
    FunctionCall,
    CodeBlock,
    SandboxRun,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OperationKind::ModuleLoad => "module-load",
            OperationKind::FunctionCall => "function-call",
            OperationKind::CodeBlock => "code-block",
            OperationKind::SandboxRun => "sandbox-run",
        };
        write!(f, "{}", label)
    }
}

/// Terminal status of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One entry in the ledger.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub kind: OperationKind,
    /// Module name, function name or sandbox test name.
    pub label: String,
    pub status: RunStatus,
    /// Present iff the attempt failed.
    pub error: Option<String>,
    /// Blocked-line location, only meaningful for sandbox runs.
    pub line: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl ExecutionRecord {
    pub fn success(kind: OperationKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            status: RunStatus::Success,
            error: None,
            line: None,
            timestamp: Local::now(),
        }
    }

    pub fn failure(
        kind: OperationKind,
        label: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            status: RunStatus::Failed,
            error: Some(error.into()),
            line: None,
            timestamp: Local::now(),
        }
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.line = Some(line.into());
        self
    }
}

/// Append-only, chronological execution history.
#[derive(Debug, Default)]
pub struct Ledger {
    records: Vec<ExecutionRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: ExecutionRecord) {
        self.records.push(entry);
    }

    /// All records, in the order they were appended.
    pub fn entries(&self) -> &[ExecutionRecord] {
        &self.records
    }

    /// Only sandbox-run records, for the audit table.
    pub fn sandbox_entries(&self) -> Vec<&ExecutionRecord> {
        self.records
            .iter()
            .filter(|r| r.kind == OperationKind::SandboxRun)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Human-readable report: full history first, then the sandbox audit
    /// table. Handles records of every shape without assuming optional
    /// fields are present.
    pub fn summary_report(&self) -> String {
        let mut out = String::new();
        out.push_str(&"=".repeat(60));
        out.push_str("\nEXECUTION SUMMARY REPORT\n");
        out.push_str(&"=".repeat(60));
        out.push('\n');

        if self.records.is_empty() {
            out.push_str("No operations recorded.\n");
        } else {
            out.push_str(&format!(
                "\nExecution history ({} operations):\n",
                self.records.len()
            ));
            for record in &self.records {
                let icon = match record.status {
                    RunStatus::Success => "✓",
                    RunStatus::Failed => "✗",
                };
                out.push_str(&format!(
                    "  {} [{}] {} - {}\n",
                    icon,
                    record.kind,
                    record.label,
                    record.timestamp.format("%H:%M:%S")
                ));
                if let Some(error) = &record.error {
                    out.push_str(&format!("      {}\n", error));
                }
            }
        }

        let sandbox = self.sandbox_entries();
        if !sandbox.is_empty() {
            out.push('\n');
            out.push_str(&"#".repeat(60));
            out.push_str("\n                   Sandbox Execution Audit\n");
            out.push_str(&"#".repeat(60));
            out.push('\n');
            out.push_str(&format!(
                "{:<15} | {:<10} | TEST NAME\n",
                "STATUS", "LOCATION"
            ));
            out.push_str(&"-".repeat(60));
            out.push('\n');
            for record in sandbox {
                let status = match record.status {
                    RunStatus::Success => "PASSED",
                    RunStatus::Failed => "BLOCKED",
                };
                out.push_str(&format!(
                    "{:<15} | {:<10} | {}\n",
                    status,
                    record.line.as_deref().unwrap_or("N/A"),
                    record.label
                ));
            }
            out.push_str(&"#".repeat(60));
            out.push('\n');
        }

        out
    }
}
