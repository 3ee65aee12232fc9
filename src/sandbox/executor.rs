//! Core execution engine for the script sandbox.
//!
//! One engine, two explicit modes:
//!
//! - [`Sandbox::execute_restricted`] runs code against the small builtin
//!   allowlist and fails the run on ANY fault: a rejected name and an
//!   ordinary bug in the code are deliberately indistinguishable here; the
//!   catch set is part of the contract.
//! - [`Sandbox::execute_with_scanning`] runs code with the full builtin
//!   table and layers the detection passes around it: static pattern scan
//!   before, call tracing during, namespace inspection after. Findings are
//!   advisory and never turn a successful run into a failure.
//!
//! Faults never escape these entry points; every path folds into an
//! [`ExecutionOutcome`].

use std::path::Path;
use std::rc::Rc;

use crate::interp::{parse, Bindings, BuiltinTable, Limits, Machine};
use crate::ledger::{ExecutionRecord, Ledger, OperationKind};
use crate::loader::ModuleRegistry;
use crate::logging::EventLog;
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::inspector;
use crate::sandbox::io::CapturedOutput;
use crate::sandbox::scanner::{self, ScanFinding};
use crate::sandbox::tracer::{self, BehavioralFlags, CallObserver};

/// Result of one sandboxed execution.
#[derive(Debug)]
pub struct ExecutionOutcome {
    /// Whether the run completed without a fault.
    pub success: bool,
    /// Top-level bindings the code produced. Empty on a restricted-mode
    /// block; partial on a scanned-mode runtime fault.
    pub namespace: Bindings,
    /// Present iff the run failed.
    pub error: Option<String>,
    /// Captured `print` output.
    pub stdout: String,
    /// Advisory findings from every detection layer, in emission order.
    pub findings: Vec<ScanFinding>,
}

impl ExecutionOutcome {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            namespace: Bindings::new(),
            error: Some(error.into()),
            stdout: String::new(),
            findings: Vec::new(),
        }
    }
}

/// A sandboxed script execution environment.
///
/// Owns the event log and the append-only execution ledger for its lifetime;
/// executions are synchronous and sequential, and no state is shared between
/// two runs beyond those records.
pub struct Sandbox {
    pub(crate) config: SandboxConfig,
    pub(crate) log: EventLog,
    pub(crate) ledger: Ledger,
    pub(crate) modules: ModuleRegistry,
}

impl Sandbox {
    /// Create a new sandbox with the given configuration.
    pub fn new(config: SandboxConfig) -> Self {
        let log = EventLog::new(config.verbose, config.log_file.clone());
        Self {
            config,
            log,
            ledger: Ledger::new(),
            modules: ModuleRegistry::new(),
        }
    }

    /// Create a sandbox with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SandboxConfig::default())
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// The execution history recorded so far.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Print the summary report to the console.
    pub fn print_summary(&self) {
        println!("{}", self.ledger.summary_report());
    }

    /// Clear all tracking data: the ledger and the module registry.
    pub fn reset(&mut self) {
        self.ledger = Ledger::new();
        self.modules = ModuleRegistry::new();
        self.log.info("sandbox state reset");
    }

    fn limits(&self) -> Limits {
        Limits {
            max_steps: self.config.max_steps,
            max_depth: self.config.max_call_depth,
        }
    }

    /// Execute code against the restricted builtin allowlist.
    ///
    /// The allowlist is fixed to print, sum, len, range, int, str, dict and
    /// list; `allow_io` additionally exposes `open`. Any fault (a name
    /// missing from the allowlist, an import, a syntax error, or a plain bug)
    /// blocks the run and reports the offending line.
    pub fn execute_restricted(
        &mut self,
        test_name: &str,
        code: &str,
        allow_io: bool,
    ) -> ExecutionOutcome {
        self.log
            .info(&format!("=== TEST: {} ===", test_name));
        let mut findings = self.static_scan(code);

        let table = BuiltinTable::restricted(allow_io);
        let mut namespace = Bindings::new();
        let mut out = CapturedOutput::new();
        let fault = match parse(code) {
            Err(fault) => Some(fault),
            Ok(program) => {
                let mut machine = Machine::new(&table, &mut out, None, self.limits());
                machine.run(&program, &mut namespace).err()
            }
        };
        let stdout = out.into_string();

        match fault {
            None => {
                if self.config.inspect_output {
                    for finding in inspector::inspect_namespace(&namespace) {
                        self.log.security(&finding.to_string());
                        findings.push(finding);
                    }
                }
                self.log
                    .success(&format!("sandbox run '{}' passed", test_name));
                self.ledger.record(
                    ExecutionRecord::success(OperationKind::SandboxRun, test_name)
                        .with_line("N/A"),
                );
                ExecutionOutcome {
                    success: true,
                    namespace,
                    error: None,
                    stdout,
                    findings,
                }
            }
            Some(fault) => {
                let line_label = fault
                    .line
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let offending = offending_line(code, fault.line);
                self.log.security(&format!(
                    "RESULT: BLOCKED on line {} -> \"{}\"",
                    line_label, offending
                ));
                self.log
                    .error(&format!("sandbox run '{}' blocked: {}", test_name, fault));
                let error = format!("Blocked on Line {}", line_label);
                self.ledger.record(
                    ExecutionRecord::failure(OperationKind::SandboxRun, test_name, error.clone())
                        .with_line(format!("Line {}", line_label)),
                );
                ExecutionOutcome {
                    success: false,
                    namespace: Bindings::new(),
                    error: Some(error),
                    stdout,
                    findings,
                }
            }
        }
    }

    /// Execute code with the full builtin table and layered scanning.
    ///
    /// Warnings from any layer never convert success to failure; a runtime
    /// fault is folded into a failed outcome, never propagated. A
    /// caller-supplied namespace is reused and returned, mutated in place.
    pub fn execute_with_scanning(
        &mut self,
        code: &str,
        namespace: Option<Bindings>,
    ) -> ExecutionOutcome {
        let mut findings = self.static_scan(code);

        let table = BuiltinTable::full();
        let mut bindings = namespace.unwrap_or_default();
        let mut out = CapturedOutput::new();

        let (fault, produced) = match parse(code) {
            Err(fault) => (Some(fault), false),
            Ok(program) => {
                let flags = Rc::new(BehavioralFlags::new());
                let fault = {
                    // The guard owns the per-thread observer slot for
                    // exactly the duration of this run.
                    let _guard = self
                        .config
                        .trace_calls
                        .then(|| tracer::install(Rc::clone(&flags) as Rc<dyn CallObserver>));
                    let hook = |name: &str| tracer::notify_call(name);
                    let mut machine =
                        Machine::new(&table, &mut out, Some(&hook), self.limits());
                    machine.run(&program, &mut bindings).err()
                };
                for finding in flags.findings() {
                    self.log.security(&finding.to_string());
                    findings.push(finding);
                }
                (fault, true)
            }
        };
        let stdout = out.into_string();

        if produced && self.config.inspect_output {
            for finding in inspector::inspect_namespace(&bindings) {
                self.log.security(&finding.to_string());
                findings.push(finding);
            }
        }

        match fault {
            None => {
                self.log.success("code block executed");
                self.ledger.record(ExecutionRecord::success(
                    OperationKind::CodeBlock,
                    "code block",
                ));
                ExecutionOutcome {
                    success: true,
                    namespace: bindings,
                    error: None,
                    stdout,
                    findings,
                }
            }
            Some(fault) => {
                let error = crate::error::SandboxError::from(fault).to_string();
                self.log.error(&format!("code block failed: {}", error));
                self.ledger.record(ExecutionRecord::failure(
                    OperationKind::CodeBlock,
                    "code block",
                    error.clone(),
                ));
                ExecutionOutcome {
                    success: false,
                    namespace: bindings,
                    error: Some(error),
                    stdout,
                    findings,
                }
            }
        }
    }

    /// Execute a script file under the restricted engine, labeled by file
    /// name. A missing file is a failed outcome, not an error.
    pub fn execute_file(&mut self, path: impl AsRef<Path>, allow_io: bool) -> ExecutionOutcome {
        let path = path.as_ref();
        if !path.exists() {
            let message = format!("File not found: {}", path.display());
            self.log.error(&message);
            return ExecutionOutcome::failure(message);
        }
        let code = match std::fs::read_to_string(path) {
            Ok(code) => code,
            Err(e) => {
                let message = format!("Error reading file: {}", e);
                self.log.error(&message);
                return ExecutionOutcome::failure(message);
            }
        };
        let label = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.execute_restricted(&label, &code, allow_io)
    }

    fn static_scan(&self, code: &str) -> Vec<ScanFinding> {
        if !self.config.static_scan {
            return Vec::new();
        }
        let findings = scanner::scan_source(code);
        for finding in &findings {
            self.log.security(&finding.to_string());
        }
        tracing::debug!(count = findings.len(), "static scan complete");
        findings
    }
}

/// Recover the offending source line for a blocked run.
///
/// 1-indexes into the trimmed code's lines when the captured line number is
/// a valid index; otherwise reports the fixed placeholder.
fn offending_line(code: &str, line: Option<u32>) -> String {
    let lines: Vec<&str> = code.trim().split('\n').collect();
    match line {
        Some(n) if n >= 1 && (n as usize) <= lines.len() => {
            lines[n as usize - 1].trim().to_string()
        }
        _ => "parser error, code likely incomplete".to_string(),
    }
}
