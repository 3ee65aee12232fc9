//! End-to-end tests for the sandboxed execution pipeline.
//!
//! These drive the public surface the way an embedding application would:
//! restricted runs, scanned runs, file execution, guarded calls and the
//! ledger views.

use std::rc::Rc;
use std::time::Duration;

use script_sandbox_rs::interp::Value;
use script_sandbox_rs::prelude::*;
use script_sandbox_rs::sandbox::tracer;

/// Helper to create a quiet test sandbox.
fn test_sandbox() -> Sandbox {
    Sandbox::new(SandboxConfig::silent())
}

/// Valid code produces every top-level binding it assigns.
#[test]
fn restricted_run_exposes_all_bindings() {
    let mut sandbox = test_sandbox();
    let code = "\
total = sum(range(10))
label = str(total)
def describe(n):
    return 'value: ' + str(n)
note = describe(total)";

    let outcome = sandbox.execute_restricted("bindings", code, false);
    assert!(outcome.success);
    assert_eq!(outcome.namespace.get("total"), Some(&Value::Int(45)));
    assert_eq!(
        outcome.namespace.get("label"),
        Some(&Value::Str("45".to_string()))
    );
    assert_eq!(
        outcome.namespace.get("note"),
        Some(&Value::Str("value: 45".to_string()))
    );
    assert!(outcome.namespace.contains_key("describe"));
}

/// Syntactically invalid code reports the parser's own failure line.
#[test]
fn syntax_error_reports_parser_line() {
    let mut sandbox = test_sandbox();
    let outcome = sandbox.execute_restricted("broken", "a = 1\nb = 2\nc = (", false);
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Blocked on Line 3"));
}

/// A name outside the restricted allowlist blocks the run, and so does an
/// ordinary bug; the two are indistinguishable by design.
#[test]
fn restricted_mode_blocks_disallowed_names() {
    let mut sandbox = test_sandbox();

    let outcome = sandbox.execute_restricted("import attempt", "import socket", false);
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Blocked on Line 1"));
    assert!(outcome.namespace.is_empty());

    let outcome = sandbox.execute_restricted("abs attempt", "x = abs(-1)", false);
    assert!(!outcome.success, "abs is not on the allowlist");

    let outcome = sandbox.execute_restricted("plain bug", "x = 1\ny = x / 0", false);
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Blocked on Line 2"));
}

/// Two identical scanned runs produce equal-shaped results and exactly two
/// ledger entries, in call order.
#[test]
fn scanned_runs_are_idempotent() {
    let mut sandbox = test_sandbox();
    let code = "def get_data():\n    return [1, 2, 3]\nitems = get_data()\ncount = len(items)";

    let first = sandbox.execute_with_scanning(code, None);
    let second = sandbox.execute_with_scanning(code, None);

    assert_eq!(first.success, second.success);
    let keys = |outcome: &ExecutionOutcome| outcome.namespace.keys().cloned().collect::<Vec<_>>();
    assert_eq!(keys(&first), keys(&second));
    assert_eq!(first.namespace.get("count"), Some(&Value::Int(3)));
    assert_eq!(second.namespace.get("count"), Some(&Value::Int(3)));
    let layers = |outcome: &ExecutionOutcome| {
        outcome
            .findings
            .iter()
            .map(|f| f.layer)
            .collect::<Vec<_>>()
    };
    assert_eq!(layers(&first), layers(&second));

    let entries = sandbox.ledger().entries();
    assert_eq!(entries.len(), 2);
    assert!(entries
        .iter()
        .all(|r| r.kind == OperationKind::CodeBlock && r.status == RunStatus::Success));
    assert!(entries[0].timestamp <= entries[1].timestamp);
}

/// The ambient call observer is restored to exactly what it was before the
/// engine ran, on success, fault and syntax-error paths alike.
#[test]
fn tracer_teardown_restores_sentinel() {
    struct Sentinel;
    impl tracer::CallObserver for Sentinel {
        fn on_call(&self, _: &str) {}
    }

    let sentinel: Rc<dyn tracer::CallObserver> = Rc::new(Sentinel);
    let _guard = tracer::install(Rc::clone(&sentinel));

    let mut sandbox = test_sandbox();
    sandbox.execute_with_scanning("x = 40 + 2", None);
    sandbox.execute_with_scanning("boom = 1 / 0", None);
    sandbox.execute_with_scanning("broken = (", None);

    let current = tracer::current_observer().expect("sentinel must still be installed");
    assert!(Rc::ptr_eq(&current, &sentinel));
}

/// Behavioral findings come from call names alone, not behavior.
#[test]
fn call_names_drive_behavioral_findings() {
    let mut sandbox = test_sandbox();
    // get_data never touches the network; the name alone trips the flag.
    let code = "def get_data():\n    return 7\nvalue = get_data()";
    let outcome = sandbox.execute_with_scanning(code, None);

    assert!(outcome.success);
    let behavioral: Vec<_> = outcome
        .findings
        .iter()
        .filter(|f| f.layer == ScanLayer::Behavioral)
        .collect();
    assert_eq!(behavioral.len(), 1);
    assert!(behavioral[0].message.contains("network"));
}

/// Secret-looking assignments in produced bindings are reported once each.
#[test]
fn output_inspection_names_the_secret_binding() {
    let mut sandbox = test_sandbox();
    let code = r#"api_key = "api_key='sk_test_abc123xyz456'""#;
    let outcome = sandbox.execute_with_scanning(code, None);

    assert!(outcome.success);
    let guardian: Vec<_> = outcome
        .findings
        .iter()
        .filter(|f| f.layer == ScanLayer::OutputGuardian)
        .collect();
    assert_eq!(guardian.len(), 1);
    assert!(guardian[0].message.contains("'api_key'"));

    // A short, harmless binding emits nothing.
    let mut sandbox = test_sandbox();
    let outcome = sandbox.execute_with_scanning("note = 'plain text'", None);
    assert!(outcome.findings.is_empty());
}

/// A script that doubles a string past a megabyte trips the flooding check.
#[test]
fn large_output_is_flagged() {
    let mut sandbox = test_sandbox();
    let code = "s = 'x'\nfor i in range(21):\n    s = s + s";
    let outcome = sandbox.execute_with_scanning(code, None);

    assert!(outcome.success);
    assert!(outcome
        .findings
        .iter()
        .any(|f| f.layer == ScanLayer::OutputGuardian && f.message.contains("KB")));
}

/// Static scanning flags obfuscated source before it runs.
#[test]
fn obfuscated_source_is_flagged_before_execution() {
    let mut sandbox = test_sandbox();
    let code = r"payload = '\x41\x42\x43'";
    let outcome = sandbox.execute_with_scanning(code, None);

    assert!(outcome.success, "findings never fail a run");
    assert!(outcome
        .findings
        .iter()
        .any(|f| f.layer == ScanLayer::Obfuscation));
}

/// End-to-end: simple arithmetic with no findings of any layer.
#[test]
fn clean_arithmetic_end_to_end() {
    let mut sandbox = test_sandbox();
    let outcome = sandbox.execute_with_scanning("result = (10+20)*2", None);

    assert!(outcome.success);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.namespace.get("result"), Some(&Value::Int(60)));
    assert!(outcome.findings.is_empty());
}

/// File execution: a real file runs under the restricted engine, a missing
/// one is a failed outcome rather than an error.
#[test]
fn file_execution_and_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("job.pys");
    std::fs::write(&path, "result = sum([1, 2, 3])").unwrap();

    let mut sandbox = test_sandbox();
    let outcome = sandbox.execute_file(&path, false);
    assert!(outcome.success);
    assert_eq!(outcome.namespace.get("result"), Some(&Value::Int(6)));

    let entries = sandbox.ledger().sandbox_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label, "job.pys");

    let missing = sandbox.execute_file(dir.path().join("gone.pys"), false);
    assert!(!missing.success);
    assert!(missing.error.unwrap().contains("File not found"));
}

/// The ledger preserves chronology across heterogeneous operations and the
/// audit view filters to sandbox runs.
#[test]
fn ledger_views_and_summary() {
    let mut sandbox = test_sandbox();
    sandbox.execute_with_scanning("a = 1", None);
    sandbox.execute_restricted("passing test", "b = 2", false);
    sandbox.execute_restricted("blocked test", "import os", false);
    sandbox.safe_call("helper", || Ok(0));

    let entries = sandbox.ledger().entries();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].kind, OperationKind::CodeBlock);
    assert_eq!(entries[3].kind, OperationKind::FunctionCall);

    let audit = sandbox.ledger().sandbox_entries();
    assert_eq!(audit.len(), 2);
    assert_eq!(audit[0].label, "passing test");
    assert_eq!(audit[1].label, "blocked test");

    let report = sandbox.ledger().summary_report();
    assert!(report.contains("PASSED"));
    assert!(report.contains("BLOCKED"));
    assert!(report.contains("helper"));
}

/// The event log writes one line per message to its file sink.
#[test]
fn log_file_records_execution_events() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("sandbox.log");
    let config = SandboxConfig::builder()
        .verbose(false)
        .log_file(&log_path)
        .build();

    let mut sandbox = Sandbox::new(config);
    sandbox.execute_restricted("logged test", "x = 1", false);
    sandbox.execute_restricted("blocked", "import os", false);

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert!(contents.lines().count() >= 2);
    assert!(contents.contains("[SUCCESS]"));
    assert!(contents.contains("[SECURITY]"));
}

/// Guarded calls retry transient failures and honor timeouts.
#[tokio::test]
async fn guarded_calls_retry_and_time_out() {
    use std::sync::atomic::{AtomicU32, Ordering};

    let mut sandbox = test_sandbox();
    static ATTEMPTS: AtomicU32 = AtomicU32::new(0);

    let policy = CallPolicy::default()
        .retries(3)
        .retry_delay(Duration::from_millis(5));
    let report = sandbox
        .safe_call_with_policy("flaky_call", policy, || {
            let n = ATTEMPTS.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 2 {
                anyhow::bail!("transient failure {}", n);
            }
            Ok(n)
        })
        .await;
    assert!(report.success);
    assert_eq!(report.attempts, 2);

    let policy = CallPolicy::default().timeout(Duration::from_millis(30));
    let report: CallReport<()> = sandbox
        .safe_call_with_policy("stuck_call", policy, || {
            std::thread::sleep(Duration::from_secs(3));
            Ok(())
        })
        .await;
    assert!(!report.success);
    assert!(report.error.unwrap().contains("timed out"));
}
