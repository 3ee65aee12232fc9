//! Sandbox configuration with builder pattern.

use std::path::PathBuf;

/// Configuration for the script sandbox.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Print log entries to the console.
    pub verbose: bool,
    /// Optional append-only log file.
    pub log_file: Option<PathBuf>,
    /// Run the static pattern scanner before execution.
    pub static_scan: bool,
    /// Install the behavioral call tracer for scanned executions.
    pub trace_calls: bool,
    /// Inspect the resulting namespace after execution.
    pub inspect_output: bool,
    /// Interpreter step budget per execution.
    pub max_steps: u64,
    /// Maximum nesting of user-function calls.
    pub max_call_depth: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            log_file: None,
            static_scan: true,
            trace_calls: true,
            inspect_output: true,
            max_steps: 5_000_000,
            max_call_depth: 64,
        }
    }
}

impl SandboxConfig {
    /// Create a new builder for SandboxConfig.
    pub fn builder() -> SandboxConfigBuilder {
        SandboxConfigBuilder::default()
    }

    /// A quiet configuration for embedding: no console output.
    pub fn silent() -> Self {
        Self {
            verbose: false,
            ..Self::default()
        }
    }
}

/// Builder for creating SandboxConfig instances.
#[derive(Debug, Clone, Default)]
pub struct SandboxConfigBuilder {
    verbose: Option<bool>,
    log_file: Option<PathBuf>,
    static_scan: Option<bool>,
    trace_calls: Option<bool>,
    inspect_output: Option<bool>,
    max_steps: Option<u64>,
    max_call_depth: Option<usize>,
}

impl SandboxConfigBuilder {
    /// Toggle console emission of log entries.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Set the append-only log file path.
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Toggle the static pattern scanner.
    pub fn static_scan(mut self, enabled: bool) -> Self {
        self.static_scan = Some(enabled);
        self
    }

    /// Toggle the behavioral call tracer.
    pub fn trace_calls(mut self, enabled: bool) -> Self {
        self.trace_calls = Some(enabled);
        self
    }

    /// Toggle post-execution namespace inspection.
    pub fn inspect_output(mut self, enabled: bool) -> Self {
        self.inspect_output = Some(enabled);
        self
    }

    /// Set the interpreter step budget.
    pub fn max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Set the maximum user-function call depth.
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = Some(depth);
        self
    }

    /// Build the SandboxConfig.
    pub fn build(self) -> SandboxConfig {
        let default = SandboxConfig::default();
        SandboxConfig {
            verbose: self.verbose.unwrap_or(default.verbose),
            log_file: self.log_file.or(default.log_file),
            static_scan: self.static_scan.unwrap_or(default.static_scan),
            trace_calls: self.trace_calls.unwrap_or(default.trace_calls),
            inspect_output: self.inspect_output.unwrap_or(default.inspect_output),
            max_steps: self.max_steps.unwrap_or(default.max_steps),
            max_call_depth: self.max_call_depth.unwrap_or(default.max_call_depth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SandboxConfig::default();
        assert!(config.verbose);
        assert!(config.static_scan);
        assert!(config.trace_calls);
        assert!(config.inspect_output);
        assert_eq!(config.max_steps, 5_000_000);
        assert_eq!(config.max_call_depth, 64);
    }

    #[test]
    fn test_builder() {
        let config = SandboxConfig::builder()
            .verbose(false)
            .log_file("sandbox.log")
            .static_scan(false)
            .max_steps(10_000)
            .build();

        assert!(!config.verbose);
        assert_eq!(config.log_file, Some(PathBuf::from("sandbox.log")));
        assert!(!config.static_scan);
        assert!(config.trace_calls);
        assert_eq!(config.max_steps, 10_000);
    }

    #[test]
    fn test_silent_config() {
        let config = SandboxConfig::silent();
        assert!(!config.verbose);
        assert!(config.static_scan);
    }
}
