//! Version classification for tracked dependencies.
//!
//! A declared version string is mapped onto one of four compatibility bands:
//!
//! - `Unresolved`: nothing concrete could be read (missing, placeholder, `RELEASE`, ranges)
//! - `Incompatible`: below the lower threshold
//! - `RequiresReview`: in `[lower, upper)`
//! - `Compatible`: at or above the upper threshold
//!
//! Only the leading numeric components take part in the comparison. A
//! qualifier such as `-SNAPSHOT`, `.Final` or `+build.7` is ignored.
//! Classification is total: malformed input is `Unresolved`, never an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

/// Compatibility band of a declared version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    Unresolved,
    Incompatible,
    RequiresReview,
    Compatible,
}

impl VerdictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Incompatible => "incompatible",
            Self::RequiresReview => "requires review",
            Self::Compatible => "compatible",
        }
    }
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification outcome together with the string it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionVerdict {
    pub kind: VerdictKind,
    pub raw: Option<String>,
}

impl VersionVerdict {
    /// Automatic edits are only allowed for compatible versions.
    pub fn is_actionable(&self) -> bool {
        self.kind == VerdictKind::Compatible
    }

    pub fn describe(&self) -> String {
        match &self.raw {
            Some(raw) => format!("{} ({})", raw, self.kind),
            None => format!("<none> ({})", self.kind),
        }
    }
}

/// A `major[.minor]` threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBound", into = "String")]
pub struct VersionBound {
    pub major: u64,
    pub minor: u64,
}

impl VersionBound {
    pub const fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }

    pub const fn major(major: u64) -> Self {
        Self { major, minor: 0 }
    }

    fn key(&self) -> (u64, u64) {
        (self.major, self.minor)
    }
}

impl fmt::Display for VersionBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl From<VersionBound> for String {
    fn from(bound: VersionBound) -> Self {
        bound.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBound {
    Number(u64),
    Text(String),
}

impl TryFrom<RawBound> for VersionBound {
    type Error = String;

    fn try_from(raw: RawBound) -> Result<Self, Self::Error> {
        match raw {
            RawBound::Number(major) => Ok(Self::major(major)),
            RawBound::Text(text) => {
                let parts = parse_numeric_prefix(&text)
                    .ok_or_else(|| format!("invalid version bound '{}'", text))?;
                Ok(Self::new(parts[0], parts.get(1).copied().unwrap_or(0)))
            }
        }
    }
}

/// Lower/upper threshold pair for one tracked dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionThresholds {
    pub lower: VersionBound,
    pub upper: VersionBound,
}

impl VersionThresholds {
    pub fn new(lower: VersionBound, upper: VersionBound) -> Self {
        Self { lower, upper }
    }

    pub fn is_well_formed(&self) -> bool {
        self.lower.key() <= self.upper.key()
    }
}

/// Classify a raw version string against a threshold pair.
pub fn classify(raw: Option<&str>, thresholds: &VersionThresholds) -> VersionVerdict {
    let kind = match raw.and_then(parse_numeric_prefix) {
        None => VerdictKind::Unresolved,
        Some(parts) => {
            let key = (parts[0], parts.get(1).copied().unwrap_or(0));
            band(key, thresholds)
        }
    };

    VersionVerdict {
        kind,
        raw: raw.map(str::to_string),
    }
}

fn band(key: (u64, u64), thresholds: &VersionThresholds) -> VerdictKind {
    match key.cmp(&thresholds.lower.key()) {
        Ordering::Less => VerdictKind::Incompatible,
        _ if key < thresholds.upper.key() => VerdictKind::RequiresReview,
        _ => VerdictKind::Compatible,
    }
}

/// Leading dot-separated numeric components of `raw`.
///
/// Returns `None` when the string is empty, carries a `${...}` placeholder,
/// does not start with a digit, or a component overflows `u64`.
pub fn parse_numeric_prefix(raw: &str) -> Option<Vec<u64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains("${") {
        return None;
    }

    let mut parts = Vec::new();
    for component in trimmed.split('.') {
        let digits: &str = match component.find(|c: char| !c.is_ascii_digit()) {
            Some(end) => &component[..end],
            None => component,
        };
        if digits.is_empty() {
            break;
        }
        parts.push(digits.parse::<u64>().ok()?);
        if digits.len() != component.len() {
            // qualifier reached
            break;
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}

/// True when `raw` still contains a `${...}` reference.
pub fn is_symbolic(raw: &str) -> bool {
    PLACEHOLDER.is_match(raw)
}

/// Substitute `${name}` references from `properties`.
///
/// Unknown references are left verbatim so the result still classifies as
/// `Unresolved`. Substitution is repeated for chained properties up to a
/// small fixed depth.
pub fn resolve_placeholders(raw: &str, properties: &BTreeMap<String, String>) -> String {
    const MAX_DEPTH: usize = 8;

    let mut current = raw.to_string();
    for _ in 0..MAX_DEPTH {
        if !is_symbolic(&current) {
            break;
        }
        let next = PLACEHOLDER
            .replace_all(&current, |caps: &regex::Captures<'_>| {
                properties
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Names of the properties referenced by `raw`, in order of appearance.
pub fn referenced_properties(raw: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(raw)
        .map(|caps| caps[1].to_string())
        .collect()
}
