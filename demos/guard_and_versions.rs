//! Guarded calls with retry/timeout, and dependency-version advisories.
//!
//! Run with: cargo run --example guard_and_versions

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use script_sandbox_rs::advisory;
use script_sandbox_rs::prelude::*;

static ATTEMPTS: AtomicU32 = AtomicU32::new(0);

#[tokio::main]
async fn main() -> Result<()> {
    let mut sandbox = Sandbox::new(SandboxConfig::silent());

    // Retry a flaky call until it succeeds
    println!("=== Retry mechanism ===");
    let policy = CallPolicy::default()
        .retries(3)
        .retry_delay(Duration::from_millis(100));
    let report = sandbox
        .safe_call_with_policy("flaky_network_call", policy, || {
            let n = ATTEMPTS.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                anyhow::bail!("network timeout on attempt {}", n);
            }
            Ok("retrieved data")
        })
        .await;
    println!(
        "success: {} after {} attempts, value: {:?}",
        report.success, report.attempts, report.value
    );

    // Cut off a call that would block forever
    println!("\n=== Timeout mechanism ===");
    let policy = CallPolicy::default().timeout(Duration::from_millis(200));
    let report: CallReport<&str> = sandbox
        .safe_call_with_policy("slow_database_query", policy, || {
            std::thread::sleep(Duration::from_secs(5));
            Ok("query result")
        })
        .await;
    println!("success: {}, error: {:?}", report.success, report.error);

    // Check an environment against version requirements
    println!("\n=== Dependency version advisory ===");
    let mut required = BTreeMap::new();
    required.insert("passlib".to_string(), ">=1.7.0".to_string());
    required.insert("bcrypt".to_string(), ">=3.2.0".to_string());

    let mut installed = BTreeMap::new();
    installed.insert("passlib".to_string(), "1.7.4".to_string());
    installed.insert("bcrypt".to_string(), "3.1.0".to_string());

    let mut available = BTreeMap::new();
    available.insert(
        "bcrypt".to_string(),
        vec!["4.1.2".to_string(), "4.0.1".to_string(), "3.2.2".to_string()],
    );

    let advisory_report =
        advisory::check_requirements(&required, &installed, Some(&available))?;
    println!("all satisfied: {}", advisory_report.all_satisfied);
    for (package, status) in &advisory_report.results {
        println!("  {}: {}", package, status.message);
        if let Some(suggestion) = &status.suggestion {
            println!("    suggested version: {}", suggestion);
        }
    }

    println!("{}", sandbox.ledger().summary_report());
    Ok(())
}
