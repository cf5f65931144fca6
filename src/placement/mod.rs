//! Placement of the generated scan configuration artifact.
//!
//! The namespace is the longest common dot-separated prefix of the packages
//! declared under a module's main sources. Packages that share no first
//! segment fall back to the configured default namespace, scan each
//! package's top two segments explicitly, and flag the result for review.

use crate::config::{ArtifactNaming, EffectiveSettings, GenerationConfig};
use crate::source::{simple_name, Declaration};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementDecision {
    pub namespace: String,
    pub base_name: String,
    /// Never empty; sorted and deduplicated.
    pub scan_roots: Vec<String>,
    pub needs_review: bool,
}

impl PlacementDecision {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.base_name)
    }

    /// Path of the artifact relative to a source root.
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.namespace.split('.').collect();
        path.push(format!("{}.java", self.base_name));
        path
    }
}

/// Compute the placement for a module's namespaces.
///
/// Returns `None` when no non-empty namespace is given; such a module gets no
/// artifact. Input order never affects the result.
pub fn resolve_placement<I, S>(
    namespaces: I,
    module_name: &str,
    settings: &EffectiveSettings,
    cfg: &GenerationConfig,
) -> Option<PlacementDecision>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let set: BTreeSet<String> = namespaces
        .into_iter()
        .map(|ns| ns.as_ref().trim().to_string())
        .filter(|ns| !ns.is_empty())
        .collect();
    if set.is_empty() {
        return None;
    }

    let prefix = common_prefix(&set);
    let (namespace, scan_roots, needs_review) = if prefix.is_empty() {
        let roots: BTreeSet<String> = set.iter().map(|ns| leading_segments(ns, 2)).collect();
        (cfg.default_namespace.clone(), roots.into_iter().collect(), true)
    } else {
        (prefix.clone(), vec![prefix], false)
    };

    let name_source = if settings.artifact_naming == ArtifactNaming::Module
        || namespace == cfg.default_namespace
    {
        module_name
    } else {
        last_segment(&namespace)
    };

    Some(PlacementDecision {
        base_name: format!("{}{}", upper_camel_case(name_source), cfg.suffix),
        namespace,
        scan_roots,
        needs_review,
    })
}

/// Longest common dot-separated prefix of all namespaces.
pub fn common_prefix(namespaces: &BTreeSet<String>) -> String {
    let mut iter = namespaces.iter();
    let Some(first) = iter.next() else {
        return String::new();
    };
    let mut prefix: Vec<&str> = first.split('.').collect();
    for ns in iter {
        let shared = prefix
            .iter()
            .zip(ns.split('.'))
            .take_while(|(a, b)| **a == *b)
            .count();
        prefix.truncate(shared);
    }
    prefix.join(".")
}

fn leading_segments(namespace: &str, count: usize) -> String {
    namespace.split('.').take(count).collect::<Vec<_>>().join(".")
}

fn last_segment(namespace: &str) -> &str {
    namespace.rsplit('.').next().unwrap_or(namespace)
}

/// `my-service_api` becomes `MyServiceApi`. A leading digit is prefixed so
/// the result is a valid type name.
pub fn upper_camel_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for word in raw.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    if out.is_empty() {
        return "Project".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "Module");
    }
    out
}

/// Text of the review annotation placed on a disjoint-placement artifact.
pub fn review_note(decision: &PlacementDecision) -> String {
    format!(
        "placement: packages share no common prefix; confirm scan roots {} (placed in {})",
        decision.scan_roots.join(", "),
        decision.namespace
    )
}

/// Render the artifact's Java source.
pub fn render_artifact(
    decision: &PlacementDecision,
    settings: &EffectiveSettings,
    cfg: &GenerationConfig,
) -> String {
    let indent = settings.indent.unit();
    let marker = simple_name(&cfg.marker_annotation);

    let mut imports = vec![cfg.marker_annotation.as_str()];
    if decision.needs_review {
        imports.push(cfg.review_annotation.as_str());
    }
    imports.sort_unstable();

    let mut out = format!("package {};\n\n", decision.namespace);
    for import in imports {
        out.push_str(&format!("import {};\n", import));
    }
    out.push('\n');

    if decision.needs_review {
        out.push_str(&format!(
            "@{}(\"{}\")\n",
            simple_name(&cfg.review_annotation),
            review_note(decision)
        ));
    }

    match decision.scan_roots.as_slice() {
        [single] => out.push_str(&format!(
            "@{}({} = \"{}\")\n",
            marker, cfg.scan_attribute, single
        )),
        roots => {
            out.push_str(&format!("@{}({} = {{\n", marker, cfg.scan_attribute));
            let lines: Vec<String> = roots
                .iter()
                .map(|root| format!("{}\"{}\"", indent, root))
                .collect();
            out.push_str(&lines.join(",\n"));
            out.push_str("\n})\n");
        }
    }

    out.push_str(&format!("public class {} {{\n}}\n", decision.base_name));
    out
}

/// True when a declaration already plays the generated artifact's role.
pub fn has_marker<'a, I>(declarations: I, cfg: &GenerationConfig) -> bool
where
    I: IntoIterator<Item = &'a Declaration>,
{
    declarations.into_iter().any(|d| {
        d.has_annotation(&cfg.marker_annotation)
            || cfg
                .marker_supertype
                .as_deref()
                .is_some_and(|s| d.has_supertype(s))
    })
}
