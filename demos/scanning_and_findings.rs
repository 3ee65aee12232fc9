//! Layered scanning: static patterns, call tracing and output inspection.
//!
//! Run with: cargo run --example scanning_and_findings

use script_sandbox_rs::prelude::*;

fn main() {
    let mut sandbox = Sandbox::new(SandboxConfig::silent());

    // The function name alone trips the behavioral network flag; no
    // network is ever touched. Findings are advisory, so the run succeeds.
    println!("=== Behavioral tracing (name-keyword heuristic) ===");
    let code = "\
def get_data():
    return [1, 2, 3]
items = get_data()
count = len(items)";
    let outcome = sandbox.execute_with_scanning(code, None);
    println!("success: {}", outcome.success);
    for finding in &outcome.findings {
        println!("finding: {}", finding);
    }

    // Escape sequences in the source are flagged before execution
    println!("\n=== Static obfuscation scan ===");
    let outcome = sandbox.execute_with_scanning(r"payload = '\x41\x42\x43'", None);
    println!("success: {}", outcome.success);
    for finding in &outcome.findings {
        println!("finding: {}", finding);
    }

    // Secret-looking assignments in the resulting namespace are reported
    println!("\n=== Output inspection ===");
    let outcome = sandbox.execute_with_scanning(
        r#"api_key = "api_key='sk_test_abc123xyz456'""#,
        None,
    );
    println!("success: {}", outcome.success);
    for finding in &outcome.findings {
        println!("finding: {}", finding);
    }

    // A clean run has no findings at all
    println!("\n=== Clean run ===");
    let outcome = sandbox.execute_with_scanning("result = (10+20)*2", None);
    println!(
        "success: {}, findings: {}",
        outcome.success,
        outcome.findings.len()
    );
}
