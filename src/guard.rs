//! Defensive call wrapping: execute host functions without letting their
//! failures terminate the process.
//!
//! [`Sandbox::safe_call`] converts errors and panics from a fallible closure
//! into a [`CallReport`]; [`Sandbox::safe_call_with_policy`] adds retries
//! and a timeout, racing the blocking call against a sleep so a stuck
//! function cannot hold the caller hostage. Every guarded call lands one
//! function-call record in the ledger.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::error::SandboxError;
use crate::ledger::{ExecutionRecord, OperationKind};
use crate::sandbox::executor::Sandbox;

/// Retry and timeout policy for guarded calls.
#[derive(Debug, Clone)]
pub struct CallPolicy {
    /// Total attempts allowed; values below 1 behave as 1.
    pub retries: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
    /// Per-attempt wall-clock limit.
    pub timeout: Option<Duration>,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            retry_delay: Duration::from_millis(500),
            timeout: None,
        }
    }
}

impl CallPolicy {
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }
}

/// What a guarded call produced.
#[derive(Debug)]
pub struct CallReport<T> {
    pub success: bool,
    /// Present iff the call succeeded.
    pub value: Option<T>,
    /// Present iff every attempt failed.
    pub error: Option<String>,
    /// Attempts actually made.
    pub attempts: u32,
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Sandbox {
    /// Execute a fallible function, converting errors and panics into a
    /// report instead of letting them propagate.
    pub fn safe_call<T>(
        &mut self,
        label: &str,
        f: impl FnOnce() -> anyhow::Result<T>,
    ) -> CallReport<T> {
        self.log.info(&format!("executing function: {}", label));
        let result = catch_unwind(AssertUnwindSafe(f));
        let (value, error) = match result {
            Ok(Ok(value)) => (Some(value), None),
            Ok(Err(e)) => (None, Some(format!("{:#}", e))),
            Err(payload) => (
                None,
                Some(SandboxError::Panicked(panic_message(payload)).to_string()),
            ),
        };
        self.finish_call(label, value, error, 1)
    }

    /// Execute a fallible function under a retry/timeout policy.
    ///
    /// Each attempt runs on the blocking pool and races a sleep when a
    /// timeout is configured; the function itself keeps running if the race
    /// is lost, but the caller gets control back. The last error wins.
    pub async fn safe_call_with_policy<T, F>(
        &mut self,
        label: &str,
        policy: CallPolicy,
        f: F,
    ) -> CallReport<T>
    where
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
        T: Send + 'static,
    {
        self.log.info(&format!("executing function: {}", label));
        let f = Arc::new(f);
        let attempts_allowed = policy.retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts_allowed {
            if attempt > 1 {
                self.log.warning(&format!(
                    "retrying {} (attempt {}/{})",
                    label, attempt, attempts_allowed
                ));
                sleep(policy.retry_delay).await;
            }

            let call = Arc::clone(&f);
            let mut handle = tokio::task::spawn_blocking(move || call());

            let joined = match policy.timeout {
                Some(limit) => {
                    tokio::select! {
                        joined = &mut handle => Some(joined),
                        _ = sleep(limit) => {
                            handle.abort();
                            last_error = SandboxError::Timeout(limit).to_string();
                            None
                        }
                    }
                }
                None => Some(handle.await),
            };

            match joined {
                None => {}
                Some(Err(join_err)) => {
                    last_error = format!("task panicked: {}", join_err);
                }
                Some(Ok(Err(e))) => {
                    last_error = format!("{:#}", e);
                }
                Some(Ok(Ok(value))) => {
                    return self.finish_call(label, Some(value), None, attempt);
                }
            }
            self.log
                .error(&format!("attempt {} of {} failed: {}", attempt, label, last_error));
        }

        self.finish_call(label, None, Some(last_error), attempts_allowed)
    }

    fn finish_call<T>(
        &mut self,
        label: &str,
        value: Option<T>,
        error: Option<String>,
        attempts: u32,
    ) -> CallReport<T> {
        match &error {
            None => {
                self.log
                    .success(&format!("{} executed successfully", label));
                self.ledger
                    .record(ExecutionRecord::success(OperationKind::FunctionCall, label));
            }
            Some(error) => {
                self.log.error(&format!("error in {}: {}", label, error));
                self.ledger.record(ExecutionRecord::failure(
                    OperationKind::FunctionCall,
                    label,
                    error.clone(),
                ));
            }
        }
        CallReport {
            success: error.is_none(),
            value,
            error,
            attempts,
        }
    }
}

/// Run one function under a throwaway quiet sandbox.
///
/// Convenience for callers that only want the containment behavior and not
/// the ledger or log.
pub fn safe_run<T>(label: &str, f: impl FnOnce() -> anyhow::Result<T>) -> CallReport<T> {
    let mut sandbox = Sandbox::new(crate::sandbox::config::SandboxConfig::silent());
    sandbox.safe_call(label, f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::config::SandboxConfig;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quiet_sandbox() -> Sandbox {
        Sandbox::new(SandboxConfig::silent())
    }

    #[test]
    fn safe_run_contains_failures_without_a_sandbox() {
        let report: CallReport<()> = safe_run("one_off", || anyhow::bail!("nope"));
        assert!(!report.success);
        assert!(report.error.unwrap().contains("nope"));
    }

    #[test]
    fn successful_call_reports_value() {
        let mut sandbox = quiet_sandbox();
        let report = sandbox.safe_call("simple_add", || Ok(10 + 20));
        assert!(report.success);
        assert_eq!(report.value, Some(30));
        assert!(report.error.is_none());
        assert_eq!(sandbox.ledger().len(), 1);
    }

    #[test]
    fn failing_call_is_contained() {
        let mut sandbox = quiet_sandbox();
        let report: CallReport<()> =
            sandbox.safe_call("risky_division", || anyhow::bail!("division by zero"));
        assert!(!report.success);
        assert!(report.error.unwrap().contains("division by zero"));
    }

    #[test]
    fn panicking_call_is_contained() {
        let mut sandbox = quiet_sandbox();
        let report: CallReport<()> = sandbox.safe_call("explodes", || panic!("kaboom"));
        assert!(!report.success);
        assert!(report.error.unwrap().contains("kaboom"));
    }

    #[test]
    fn retry_succeeds_after_transient_failures() {
        let mut sandbox = quiet_sandbox();
        static ATTEMPTS: AtomicU32 = AtomicU32::new(0);
        let policy = CallPolicy::default()
            .retries(3)
            .retry_delay(Duration::from_millis(10));

        let report = tokio_test::block_on(sandbox.safe_call_with_policy(
            "flaky_network_call",
            policy,
            || {
                let n = ATTEMPTS.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    anyhow::bail!("network timeout on attempt {}", n);
                }
                Ok("retrieved data")
            },
        ));

        assert!(report.success);
        assert_eq!(report.attempts, 3);
        assert_eq!(report.value, Some("retrieved data"));
    }

    #[test]
    fn timeout_cuts_off_slow_calls() {
        let mut sandbox = quiet_sandbox();
        let policy = CallPolicy::default().timeout(Duration::from_millis(50));

        let report: CallReport<&str> = tokio_test::block_on(sandbox.safe_call_with_policy(
            "slow_database_query",
            policy,
            || {
                std::thread::sleep(Duration::from_secs(5));
                Ok("query result")
            },
        ));

        assert!(!report.success);
        assert!(report.error.unwrap().contains("timed out"));
    }

    #[test]
    fn exhausted_retries_report_last_error() {
        let mut sandbox = quiet_sandbox();
        let policy = CallPolicy::default()
            .retries(2)
            .retry_delay(Duration::from_millis(5));

        let report: CallReport<()> = tokio_test::block_on(sandbox.safe_call_with_policy(
            "always_fails",
            policy,
            || anyhow::bail!("still broken"),
        ));

        assert!(!report.success);
        assert_eq!(report.attempts, 2);
        assert!(report.error.unwrap().contains("still broken"));
    }
}
