//! Post-execution namespace inspection: the output-guardian layer.
//!
//! Runs once over the bindings an execution produced. Two checks: the
//! combined size of all stringified values (log-flooding risk), and a
//! bounded window of each value tested against secret-assignment patterns.
//! Neither check ever changes the execution outcome.

use std::sync::LazyLock;

use regex::Regex;

use crate::interp::{Bindings, Value};
use crate::sandbox::scanner::{ScanFinding, ScanLayer};

/// Combined stringified size above which the large-output finding fires.
pub const LARGE_OUTPUT_BYTES: usize = 1_000_000;

/// How many leading characters of each value are scanned for secrets.
pub const SECRET_SCAN_WINDOW: usize = 2_000;

// Quoted-assignment shapes with per-kind minimum value lengths.
static SECRET_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "password",
            Regex::new(r#"(?i)password\s*=\s*['"][^'"]{8,}['"]"#).expect("password pattern"),
        ),
        (
            "api_key",
            Regex::new(r#"(?i)api_key\s*=\s*['"][^'"]{20,}['"]"#).expect("api_key pattern"),
        ),
        (
            "token",
            Regex::new(r#"(?i)token\s*=\s*['"][^'"]{30,}['"]"#).expect("token pattern"),
        ),
        (
            "secret",
            Regex::new(r#"(?i)secret\s*=\s*['"][^'"]{15,}['"]"#).expect("secret pattern"),
        ),
    ]
});

/// Inspect the bindings an execution produced.
pub fn inspect_namespace(bindings: &Bindings) -> Vec<ScanFinding> {
    let mut findings = Vec::new();

    let total: usize = bindings
        .values()
        .filter(|v| !matches!(v, Value::None))
        .map(|v| v.to_string().len())
        .sum();
    if total > LARGE_OUTPUT_BYTES {
        findings.push(ScanFinding::new(
            ScanLayer::OutputGuardian,
            format!(
                "combined output size {:.1} KB may flood logs",
                total as f64 / 1024.0
            ),
        ));
    }

    for (name, value) in bindings {
        // Reserved names and the builtin allowlist are not user output.
        if name.starts_with("__") {
            continue;
        }
        let text: String = value.to_string().chars().take(SECRET_SCAN_WINDOW).collect();
        for (kind, pattern) in SECRET_PATTERNS.iter() {
            if pattern.is_match(&text) {
                findings.push(ScanFinding::new(
                    ScanLayer::OutputGuardian,
                    format!("binding '{}' may contain a hardcoded {} value", name, kind),
                ));
                // One finding per binding; stop at the first match.
                break;
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, Value)]) -> Bindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn clean_namespace_is_quiet() {
        let ns = bindings(&[
            ("result", Value::Int(60)),
            ("note", Value::Str("short and harmless".into())),
        ]);
        assert!(inspect_namespace(&ns).is_empty());
    }

    #[test]
    fn api_key_assignment_is_reported_once() {
        let ns = bindings(&[(
            "api_key",
            Value::Str("api_key='sk_test_abc123xyz456'".into()),
        )]);
        let findings = inspect_namespace(&ns);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].layer, ScanLayer::OutputGuardian);
        assert!(findings[0].message.contains("'api_key'"));
    }

    #[test]
    fn short_quoted_values_stay_below_thresholds() {
        // 7-char password and 10-char api_key are under their minimums.
        let ns = bindings(&[
            ("a", Value::Str("password='2short1'".into())),
            ("b", Value::Str("api_key='abcdefghij'".into())),
        ]);
        assert!(inspect_namespace(&ns).is_empty());
    }

    #[test]
    fn one_binding_never_double_reports() {
        // Matches both the password and secret patterns; only the first
        // pattern fires.
        let ns = bindings(&[(
            "creds",
            Value::Str("password='hunter2hunter2' secret='also-very-long-here'".into()),
        )]);
        let findings = inspect_namespace(&ns);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn reserved_names_are_skipped() {
        let ns = bindings(&[(
            "__stash__",
            Value::Str("password='hunter2hunter2'".into()),
        )]);
        assert!(inspect_namespace(&ns).is_empty());
    }

    #[test]
    fn secrets_beyond_the_window_are_missed() {
        let mut text = "x".repeat(SECRET_SCAN_WINDOW);
        text.push_str("password='hunter2hunter2'");
        let ns = bindings(&[("log", Value::Str(text))]);
        assert!(inspect_namespace(&ns).is_empty());
    }

    #[test]
    fn large_output_threshold_is_exclusive() {
        // Exactly at the threshold: no finding.
        let at = bindings(&[("blob", Value::Str("x".repeat(LARGE_OUTPUT_BYTES)))]);
        assert!(inspect_namespace(&at).is_empty());

        // One byte over: the flooding warning fires.
        let over = bindings(&[("blob", Value::Str("x".repeat(LARGE_OUTPUT_BYTES + 1)))]);
        let findings = inspect_namespace(&over);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("KB"));
    }

    #[test]
    fn none_values_do_not_count_toward_size() {
        let ns = bindings(&[
            ("a", Value::None),
            ("blob", Value::Str("x".repeat(LARGE_OUTPUT_BYTES))),
        ]);
        // "None" would not tip the sum anyway, but the value is excluded
        // outright.
        assert!(inspect_namespace(&ns).is_empty());
    }
}
