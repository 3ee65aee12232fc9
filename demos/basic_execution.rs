//! Basic example of executing script code in the sandbox.
//!
//! Run with: cargo run --example basic_execution

use script_sandbox_rs::prelude::*;

fn main() {
    let config = SandboxConfig::builder().verbose(true).build();
    let mut sandbox = Sandbox::new(config);

    // Execute simple arithmetic under the restricted allowlist
    println!("\n=== Test 1: Simple arithmetic ===");
    let outcome = sandbox.execute_restricted("arithmetic", "result = (10+20)*2", false);
    println!("success: {}", outcome.success);
    if let Some(result) = outcome.namespace.get("result") {
        println!("result binding: {}", result);
    }

    // Execute with a loop and captured print output
    println!("\n=== Test 2: Loop execution ===");
    let code = "\
total = 0
for i in range(5):
    total += i
    print('count:', i)
print('total:', total)";
    let outcome = sandbox.execute_restricted("loop", code, false);
    println!("stdout:\n{}", outcome.stdout);

    // An import is blocked with the offending line reported
    println!("\n=== Test 3: Blocked import ===");
    let outcome = sandbox.execute_restricted("import attempt", "import os", false);
    println!("success: {}", outcome.success);
    if let Some(error) = &outcome.error {
        println!("error: {}", error);
    }

    // The ledger keeps every attempt in order
    println!("{}", sandbox.ledger().summary_report());
}
