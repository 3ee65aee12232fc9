//! Dependency-version advisory checks.
//!
//! Compares installed package versions against requirement strings like
//! `>=1.7.0` and, given lists of available versions, suggests the highest
//! one that satisfies each requirement. Purely ad-hoc string-version
//! comparison; segments are numeric, missing segments count as zero, so
//! `1.7` equals `1.7.0`.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SandboxError};

/// A dotted numeric version such as `1.7.4`.
#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
}

impl FromStr for Version {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SandboxError::InvalidVersion(s.to_string()));
        }
        let segments = trimmed
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| SandboxError::InvalidVersion(s.to_string()))?;
        Ok(Self { segments })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl Version {
    fn cmp_padded(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_padded(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_padded(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_padded(other)
    }
}

/// Comparison operator of a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Ge,
    Gt,
    Le,
    Lt,
    Eq,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sym = match self {
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Lt => "<",
            CompareOp::Eq => "==",
        };
        write!(f, "{}", sym)
    }
}

/// A parsed requirement such as `>=1.7.0`. A bare version means `==`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub op: CompareOp,
    pub version: Version,
}

impl FromStr for Requirement {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let (op, rest) = if let Some(rest) = trimmed.strip_prefix(">=") {
            (CompareOp::Ge, rest)
        } else if let Some(rest) = trimmed.strip_prefix("<=") {
            (CompareOp::Le, rest)
        } else if let Some(rest) = trimmed.strip_prefix("==") {
            (CompareOp::Eq, rest)
        } else if let Some(rest) = trimmed.strip_prefix('>') {
            (CompareOp::Gt, rest)
        } else if let Some(rest) = trimmed.strip_prefix('<') {
            (CompareOp::Lt, rest)
        } else {
            (CompareOp::Eq, trimmed)
        };
        let version = rest
            .parse::<Version>()
            .map_err(|_| SandboxError::InvalidRequirement(s.to_string()))?;
        Ok(Self { op, version })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

impl Requirement {
    /// Does `candidate` satisfy this requirement?
    pub fn matches(&self, candidate: &Version) -> bool {
        match self.op {
            CompareOp::Ge => candidate >= &self.version,
            CompareOp::Gt => candidate > &self.version,
            CompareOp::Le => candidate <= &self.version,
            CompareOp::Lt => candidate < &self.version,
            CompareOp::Eq => candidate == &self.version,
        }
    }
}

/// Status of one checked package.
#[derive(Debug)]
pub struct PackageStatus {
    pub satisfied: bool,
    pub installed: Option<Version>,
    pub message: String,
    /// Highest available version satisfying the requirement, when an
    /// availability list was supplied and it differs from the installed one.
    pub suggestion: Option<Version>,
}

/// Result of checking a whole requirement set.
#[derive(Debug)]
pub struct AdvisoryReport {
    pub all_satisfied: bool,
    pub results: BTreeMap<String, PackageStatus>,
}

/// Check installed packages against requirements.
///
/// `available` optionally maps package names to known version lists used to
/// compute upgrade/adjustment suggestions.
pub fn check_requirements(
    required: &BTreeMap<String, String>,
    installed: &BTreeMap<String, String>,
    available: Option<&BTreeMap<String, Vec<String>>>,
) -> Result<AdvisoryReport> {
    let mut results = BTreeMap::new();
    let mut all_satisfied = true;

    for (package, requirement_text) in required {
        let requirement: Requirement = requirement_text.parse()?;

        let installed_version = match installed.get(package) {
            Some(text) => Some(text.parse::<Version>()?),
            None => None,
        };

        let satisfied = installed_version
            .as_ref()
            .map(|v| requirement.matches(v))
            .unwrap_or(false);

        let suggestion = available
            .and_then(|map| map.get(package))
            .map(|candidates| -> Result<Option<Version>> {
                let mut best: Option<Version> = None;
                for text in candidates {
                    let candidate = text.parse::<Version>()?;
                    if requirement.matches(&candidate)
                        && best.as_ref().map(|b| candidate > *b).unwrap_or(true)
                    {
                        best = Some(candidate);
                    }
                }
                Ok(best)
            })
            .transpose()?
            .flatten()
            .filter(|best| installed_version.as_ref() != Some(best));

        let message = match (&installed_version, satisfied) {
            (Some(v), true) => format!("{} {} satisfies {}", package, v, requirement),
            (Some(v), false) => {
                format!("{} {} does not satisfy {}", package, v, requirement)
            }
            (None, _) => format!("{} is not installed (requires {})", package, requirement),
        };

        if !satisfied {
            all_satisfied = false;
        }
        results.insert(
            package.clone(),
            PackageStatus {
                satisfied,
                installed: installed_version,
                message,
                suggestion,
            },
        );
    }

    Ok(AdvisoryReport {
        all_satisfied,
        results,
    })
}
