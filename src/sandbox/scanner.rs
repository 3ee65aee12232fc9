//! Static pattern scanning over source text.
//!
//! Runs before any execution and looks for textual signatures commonly used
//! to hide code intent: encoding/dynamic-execution calls, dense dunder
//! identifiers and escape-sequence obfuscation. Findings are advisory only;
//! the scanner never blocks execution.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Which detection layer produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanLayer {
    /// Static source-text patterns, before execution.
    Obfuscation,
    /// Call-name keywords observed while the code ran.
    Behavioral,
    /// Post-execution namespace inspection.
    OutputGuardian,
}

impl fmt::Display for ScanLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScanLayer::Obfuscation => "obfuscation",
            ScanLayer::Behavioral => "behavioral",
            ScanLayer::OutputGuardian => "output-guardian",
        };
        write!(f, "{}", label)
    }
}

/// A single advisory warning. Findings never escalate to errors and never
/// change the success or failure of the execution that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFinding {
    pub layer: ScanLayer,
    pub message: String,
}

impl ScanFinding {
    pub fn new(layer: ScanLayer, message: impl Into<String>) -> Self {
        Self {
            layer,
            message: message.into(),
        }
    }
}

impl fmt::Display for ScanFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.layer, self.message)
    }
}

/// Dunder identifiers at or above this count are reported.
pub const DUNDER_THRESHOLD: usize = 20;

// Base64 decoding, exec/eval/compile and dynamic import call shapes.
static ENCODING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(b64decode\s*\(|base64\s*\.|\bexec\s*\(|\beval\s*\(|\bcompile\s*\(|__import__\s*\()",
    )
    .expect("encoding pattern is valid")
});

static DUNDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b__[A-Za-z_][A-Za-z0-9_]*__\b").expect("dunder pattern is valid")
});

static ESCAPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\x[0-9a-fA-F]{2}|\\u[0-9a-fA-F]{4}").expect("escape pattern is valid")
});

/// Scan raw source text for obfuscation signatures.
pub fn scan_source(code: &str) -> Vec<ScanFinding> {
    let mut findings = Vec::new();

    if ENCODING_PATTERN.is_match(code) {
        findings.push(ScanFinding::new(
            ScanLayer::Obfuscation,
            "encoding/dynamic-execution pattern detected",
        ));
    }

    let dunder_count = DUNDER_PATTERN.find_iter(code).count();
    if dunder_count >= DUNDER_THRESHOLD {
        findings.push(ScanFinding::new(
            ScanLayer::Obfuscation,
            format!(
                "{} dunder identifiers found (threshold {})",
                dunder_count, DUNDER_THRESHOLD
            ),
        ));
    }

    if ESCAPE_PATTERN.is_match(code) {
        findings.push(ScanFinding::new(
            ScanLayer::Obfuscation,
            "escape-sequence obfuscation detected",
        ));
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_code_has_no_findings() {
        assert!(scan_source("result = (10+20)*2").is_empty());
    }

    #[test]
    fn detects_dynamic_execution_calls() {
        for code in [
            "x = eval('1+1')",
            "exec ('print(1)')",
            "data = b64decode(blob)",
            "mod = __import__('os')",
            "payload = base64 . b64decode(x)",
        ] {
            let findings = scan_source(code);
            assert_eq!(findings.len(), 1, "code: {}", code);
            assert_eq!(findings[0].layer, ScanLayer::Obfuscation);
            assert!(findings[0].message.contains("dynamic-execution"));
        }
    }

    #[test]
    fn evaluate_is_not_flagged_as_eval() {
        assert!(scan_source("evaluate = 1\nx = evaluate(2)").is_empty());
    }

    #[test]
    fn dunder_density_reported_with_count() {
        let code = (0..20)
            .map(|i| format!("a{} = __name{}__", i, i))
            .collect::<Vec<_>>()
            .join("\n");
        let findings = scan_source(&code);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("20"));
        assert!(findings[0].message.contains("threshold 20"));
    }

    #[test]
    fn nineteen_dunders_stay_quiet() {
        let code = (0..19)
            .map(|i| format!("a{} = __name{}__", i, i))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(scan_source(&code).is_empty());
    }

    #[test]
    fn detects_escape_sequences() {
        let findings = scan_source(r"s = '\x41\x42'");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("escape-sequence"));

        let findings = scan_source(r"s = '\u0041'");
        assert_eq!(findings.len(), 1);

        assert!(scan_source("s = 'A'").is_empty());
    }

    #[test]
    fn layers_stack_independently() {
        let findings = scan_source(r"x = eval('\x41')");
        assert_eq!(findings.len(), 2);
    }
}
