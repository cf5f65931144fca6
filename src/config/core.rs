use serde::{Deserialize, Serialize};

use super::settings::ModuleSettings;
use crate::descriptor::Coordinate;
use crate::version::{VersionBound, VersionThresholds};

/// Root configuration structure, read from `depshift.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DepshiftConfig {
    /// Dependencies whose declared version gates automatic edits
    #[serde(default)]
    pub tracked: Vec<TrackedDependency>,

    /// "A before B" constraints on dependency-management entries
    #[serde(default)]
    pub ordering: Vec<OrderingRule>,

    /// Managed entries to remove
    #[serde(default)]
    pub obsolete: Vec<ObsoleteEntry>,

    /// Managed entries to add when missing
    #[serde(default)]
    pub inject: Vec<InjectedEntry>,

    /// Generated scan configuration artifact
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Process-wide module settings
    #[serde(default)]
    pub defaults: ModuleSettings,

    /// Ignore patterns
    #[serde(default)]
    pub ignore: Option<IgnoreConfig>,
}

impl DepshiftConfig {
    /// Get ignore patterns from configuration
    ///
    /// Returns glob patterns, relative to the project root, excluded from the walk.
    pub fn get_ignore_patterns(&self) -> Vec<String> {
        self.ignore
            .as_ref()
            .map(|ig| ig.patterns.clone())
            .unwrap_or_default()
    }

    pub fn tracked(&self, name: &str) -> Option<&TrackedDependency> {
        self.tracked.iter().find(|t| t.name == name)
    }

    /// Gate names that do not match any tracked dependency.
    pub fn unknown_gates(&self) -> Vec<String> {
        let gates = self
            .ordering
            .iter()
            .filter_map(|r| r.gate.as_deref())
            .chain(self.obsolete.iter().filter_map(|r| r.gate.as_deref()))
            .chain(self.inject.iter().filter_map(|r| r.gate.as_deref()))
            .chain(self.generation.gate.as_deref());
        gates
            .filter(|g| self.tracked(g).is_none())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedDependency {
    pub name: String,
    pub coordinate: Coordinate,
    pub lower: VersionBound,
    pub upper: VersionBound,
}

impl TrackedDependency {
    pub fn thresholds(&self) -> VersionThresholds {
        VersionThresholds::new(self.lower, self.upper)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderingRule {
    /// Entry that must come first
    pub first: Coordinate,
    /// Entry that must come after `first`
    pub second: Coordinate,
    /// Tracked dependency whose verdict gates the fix
    #[serde(default)]
    pub gate: Option<String>,
    /// A parent descriptor that manages both entries, making order irrelevant
    #[serde(default)]
    pub superseding_parent: Option<Coordinate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObsoleteEntry {
    pub coordinate: Coordinate,
    #[serde(default)]
    pub gate: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InjectedEntry {
    pub coordinate: Coordinate,
    pub version: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Only inject into modules that declare this dependency
    #[serde(default)]
    pub when_present: Option<Coordinate>,
    #[serde(default)]
    pub gate: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationConfig {
    /// Fully qualified annotation placed on the generated type
    #[serde(default = "default_marker_annotation")]
    pub marker_annotation: String,

    /// Types extending or implementing this are treated as already generated
    #[serde(default)]
    pub marker_supertype: Option<String>,

    /// Annotation attribute that receives the scan roots
    #[serde(default = "default_scan_attribute")]
    pub scan_attribute: String,

    /// Namespace used when the module's packages share no prefix
    #[serde(default = "default_namespace")]
    pub default_namespace: String,

    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Fully qualified review annotation added when placement needs review
    #[serde(default = "default_review_annotation")]
    pub review_annotation: String,

    #[serde(default)]
    pub gate: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            marker_annotation: default_marker_annotation(),
            marker_supertype: None,
            scan_attribute: default_scan_attribute(),
            default_namespace: default_namespace(),
            suffix: default_suffix(),
            review_annotation: default_review_annotation(),
            gate: None,
        }
    }
}

fn default_marker_annotation() -> String {
    "org.springframework.context.annotation.ComponentScan".to_string()
}
fn default_scan_attribute() -> String {
    "basePackages".to_string()
}
fn default_namespace() -> String {
    "app".to_string()
}
fn default_suffix() -> String {
    "ScanConfiguration".to_string()
}
fn default_review_annotation() -> String {
    "depshift.NeedsReview".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreConfig {
    pub patterns: Vec<String>,
}
