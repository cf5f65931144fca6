//! Mutate pass: apply decided outcomes, one atomic rewrite per file.

use super::marker::{existing_markers, xml_comment};
use super::outcome::{Action, ModuleDecision, Outcome};
use crate::config::InjectedEntry;
use crate::descriptor::edit::{indent_block, indentation_at, insert_line_above, swap, whole_line_span};
use crate::descriptor::{apply_edits, Coordinate, PomDocument, Section, TextEdit};
use crate::errors::{FileFailure, FileResults};
use crate::io::write_atomic;
use anyhow::{anyhow, Context};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: PathBuf,
    pub created: bool,
    /// Structural edits (reorders, removals, injections).
    pub edits: usize,
    pub markers_added: usize,
    /// False in dry-run mode.
    pub written: bool,
}

#[derive(Debug, Default)]
pub struct MutationReport {
    pub changes: Vec<FileChange>,
    /// Files whose outcomes were already in effect.
    pub unchanged: usize,
    pub failures: Vec<FileFailure>,
}

/// Apply every Mark and Apply outcome. Files are independent and handled in
/// parallel; all outcomes for one file land in a single rewrite.
pub fn mutate(decisions: &[ModuleDecision], dry_run: bool) -> MutationReport {
    let mut by_file: BTreeMap<&Path, Vec<&Outcome>> = BTreeMap::new();
    for planned in decisions.iter().flat_map(|d| &d.outcomes) {
        if planned.outcome.touches_file() {
            by_file
                .entry(planned.file.as_path())
                .or_default()
                .push(&planned.outcome);
        }
    }

    let results: Vec<Result<Option<FileChange>, FileFailure>> = by_file
        .into_par_iter()
        .map(|(path, outcomes)| mutate_file(path, &outcomes, dry_run))
        .collect();
    let results = FileResults::from_results(results);

    let mut report = MutationReport {
        failures: results.failures,
        ..Default::default()
    };
    for change in results.successes {
        match change {
            Some(change) => report.changes.push(change),
            None => report.unchanged += 1,
        }
    }
    report.changes.sort_by(|a, b| a.path.cmp(&b.path));
    report
}

fn mutate_file(path: &Path, outcomes: &[&Outcome], dry_run: bool) -> Result<Option<FileChange>, FileFailure> {
    let generated = outcomes.iter().find_map(|o| match o {
        Outcome::Apply(Action::Generate { content, .. }) => Some(content),
        _ => None,
    });
    match generated {
        Some(content) => create_artifact(path, content, dry_run),
        None => rewrite_descriptor(path, outcomes, dry_run),
    }
}

fn create_artifact(path: &Path, content: &str, dry_run: bool) -> Result<Option<FileChange>, FileFailure> {
    if path.exists() {
        debug!("{} already exists, not generating", path.display());
        return Ok(None);
    }
    if !dry_run {
        let write = || -> anyhow::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            write_atomic(path, content)?;
            Ok(())
        };
        write().map_err(|e| FileFailure::file_write(path.to_path_buf(), e))?;
    }
    Ok(Some(FileChange {
        path: path.to_path_buf(),
        created: true,
        edits: 1,
        markers_added: 0,
        written: !dry_run,
    }))
}

fn rewrite_descriptor(path: &Path, outcomes: &[&Outcome], dry_run: bool) -> Result<Option<FileChange>, FileFailure> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))
        .map_err(|e| FileFailure::file_read(path.to_path_buf(), e))?;
    let pom = PomDocument::parse(&text).map_err(|e| FileFailure::descriptor_parse(path.to_path_buf(), e.into()))?;
    let unit = indent_unit(&text);

    let mut accepted: Vec<TextEdit> = Vec::new();
    let mut edits = 0;
    let mut markers_added = 0;

    for outcome in outcomes {
        let group = match outcome_edits(&text, &pom, outcome, &unit) {
            Ok(group) => group,
            Err(e) => {
                warn!("{}: {:#}", path.display(), e);
                continue;
            }
        };
        if group.is_empty() {
            continue;
        }
        if group.iter().any(|e| accepted.iter().any(|a| overlaps(e, a))) {
            warn!(
                "{}: edits for one outcome overlap another; leaving it for the next run",
                path.display()
            );
            continue;
        }
        accepted.extend(group);
        match outcome {
            Outcome::Mark { .. } => markers_added += 1,
            _ => edits += 1,
        }
    }

    if accepted.is_empty() {
        return Ok(None);
    }
    let updated = apply_edits(&text, &accepted)
        .map_err(|e| FileFailure::file_write(path.to_path_buf(), e.into()))?;
    if updated == text {
        return Ok(None);
    }
    if !dry_run {
        write_atomic(path, &updated)
            .with_context(|| format!("writing {}", path.display()))
            .map_err(|e| FileFailure::file_write(path.to_path_buf(), e))?;
    }

    Ok(Some(FileChange {
        path: path.to_path_buf(),
        created: false,
        edits,
        markers_added,
        written: !dry_run,
    }))
}

/// Edits realising one outcome; empty when it is already in effect.
fn outcome_edits(text: &str, pom: &PomDocument, outcome: &Outcome, unit: &str) -> anyhow::Result<Vec<TextEdit>> {
    let managed = |profile: &Option<String>| {
        pom.section(profile.as_deref(), Section::DependencyManagement)
            .ok_or_else(|| anyhow!("profile {:?} not found", profile))
    };

    match outcome {
        Outcome::Skip { .. } => Ok(Vec::new()),
        Outcome::Mark { text: note, anchor } => {
            if existing_markers(text).contains(note) {
                return Ok(Vec::new());
            }
            let comment = xml_comment(note);
            let entry = managed(&anchor.profile)?
                .find(&anchor.coordinate)
                .ok_or_else(|| anyhow!("{} not found", anchor.coordinate))?;
            Ok(vec![insert_line_above(text, entry.range.start, &comment)])
        }
        Outcome::Apply(Action::Reorder {
            profile,
            first,
            second,
        }) => {
            let section = managed(profile)?;
            let (Some(a), Some(b)) = (section.find(first), section.find(second)) else {
                return Ok(Vec::new());
            };
            if a.ordinal < b.ordinal {
                return Ok(Vec::new());
            }
            Ok(swap(text, b.range.clone(), a.range.clone()).to_vec())
        }
        Outcome::Apply(Action::RemoveManaged {
            profile,
            coordinate,
            unused_properties,
        }) => {
            let Some(entry) = managed(profile)?.find(coordinate) else {
                return Ok(Vec::new());
            };
            let mut edits = vec![TextEdit::delete(whole_line_span(text, entry.range.clone()))];
            edits.extend(
                unused_properties
                    .iter()
                    .filter_map(|name| pom.property(name))
                    .map(|p| TextEdit::delete(whole_line_span(text, p.range.clone()))),
            );
            Ok(edits)
        }
        Outcome::Apply(Action::InjectManaged { entry, before }) => {
            if pom.managed.find(&entry.coordinate).is_some() {
                return Ok(Vec::new());
            }
            Ok(vec![inject_edit(text, pom, entry, before.as_ref(), unit)])
        }
        Outcome::Apply(Action::Generate { .. }) => Err(anyhow!("artifact generation planned against a descriptor")),
    }
}

fn inject_edit(text: &str, pom: &PomDocument, entry: &InjectedEntry, before: Option<&Coordinate>, unit: &str) -> TextEdit {
    let block = dependency_block(entry, unit);

    if let Some(anchor) = before.and_then(|c| pom.managed.find(c)) {
        let indent = indentation_at(text, anchor.range.start);
        return insert_line_above(text, anchor.range.start, indent_block(&block, indent).trim_start());
    }
    if let Some(last) = pom.managed.entries.last() {
        let indent = indentation_at(text, last.range.start);
        return TextEdit::insert(last.range.end, format!("\n{}", indent_block(&block, indent)));
    }
    if let Some(range) = &pom.managed.range {
        return insert_child(text, closing_tag(text, range), &block, unit);
    }

    let wrapped = format!("<dependencies>\n{}\n</dependencies>", indent_block(&block, unit));
    if let Some(range) = &pom.management_range {
        return insert_child(text, closing_tag(text, range), &wrapped, unit);
    }
    let management = format!(
        "<dependencyManagement>\n{}\n</dependencyManagement>",
        indent_block(&wrapped, unit)
    );
    insert_child(text, pom.project_close, &management, unit)
}

fn dependency_block(entry: &InjectedEntry, unit: &str) -> String {
    let mut lines = vec![
        "<dependency>".to_string(),
        format!("{}<groupId>{}</groupId>", unit, entry.coordinate.group_id),
        format!("{}<artifactId>{}</artifactId>", unit, entry.coordinate.artifact_id),
        format!("{}<version>{}</version>", unit, entry.version),
    ];
    if let Some(kind) = &entry.kind {
        lines.push(format!("{}<type>{}</type>", unit, kind));
    }
    if let Some(scope) = &entry.scope {
        lines.push(format!("{}<scope>{}</scope>", unit, scope));
    }
    lines.push("</dependency>".to_string());
    lines.join("\n")
}

fn closing_tag(text: &str, range: &std::ops::Range<usize>) -> usize {
    text[range.clone()]
        .rfind("</")
        .map(|offset| range.start + offset)
        .unwrap_or(range.end)
}

/// Insert `block` as the last child of the element closing at `close`.
fn insert_child(text: &str, close: usize, block: &str, unit: &str) -> TextEdit {
    let close_indent = indentation_at(text, close);
    let inner = format!("{}{}", close_indent, unit);
    let line_start = close - close_indent.len();
    if line_start == 0 || text[..line_start].ends_with('\n') {
        TextEdit::insert(line_start, format!("{}\n", indent_block(block, &inner)))
    } else {
        TextEdit::insert(close, format!("\n{}\n{}", indent_block(block, &inner), close_indent))
    }
}

/// Indentation unit used by the document; four spaces when none is found.
fn indent_unit(text: &str) -> String {
    text.lines()
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .find(|indent| !indent.is_empty())
        .unwrap_or("    ")
        .to_string()
}

fn overlaps(a: &TextEdit, b: &TextEdit) -> bool {
    a.range.start < b.range.end && b.range.start < a.range.end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::outcome::{Anchor, PlannedOutcome};
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const POM: &str = indoc! {r#"
        <project>
          <properties>
            <jaxb.version>2.3.1</jaxb.version>
            <other.version>2.0</other.version>
          </properties>
          <dependencyManagement>
            <dependencies>
              <dependency>
                <groupId>org.other</groupId>
                <artifactId>other-bom</artifactId>
                <version>${other.version}</version>
              </dependency>
              <dependency>
                <groupId>org.lib</groupId>
                <artifactId>lib-bom</artifactId>
                <version>14.0.0</version>
              </dependency>
              <dependency>
                <groupId>javax.xml</groupId>
                <artifactId>jaxb-api</artifactId>
                <version>${jaxb.version}</version>
              </dependency>
            </dependencies>
          </dependencyManagement>
        </project>
    "#};

    fn coord(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn decision(file: &Path, outcomes: Vec<Outcome>) -> Vec<ModuleDecision> {
        vec![ModuleDecision {
            module: ".".to_string(),
            verdicts: BTreeMap::new(),
            outcomes: outcomes
                .into_iter()
                .map(|outcome| PlannedOutcome {
                    file: file.to_path_buf(),
                    topic: "test".to_string(),
                    outcome,
                })
                .collect(),
        }]
    }

    fn setup() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pom.xml");
        fs::write(&path, POM).unwrap();
        (dir, path)
    }

    #[test]
    fn test_remove_and_reorder_in_one_rewrite() {
        let (_dir, path) = setup();
        let outcomes = vec![
            Outcome::Apply(Action::Reorder {
                profile: None,
                first: coord("org.lib:lib-bom"),
                second: coord("org.other:other-bom"),
            }),
            Outcome::Apply(Action::RemoveManaged {
                profile: None,
                coordinate: coord("javax.xml:jaxb-api"),
                unused_properties: vec!["jaxb.version".to_string()],
            }),
        ];
        let report = mutate(&decision(&path, outcomes.clone()), false);
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].edits, 2);

        let updated = fs::read_to_string(&path).unwrap();
        let pom = PomDocument::parse(&updated).unwrap();
        let order: Vec<&str> = pom.managed.entries.iter().map(|e| e.coordinate.artifact_id.as_str()).collect();
        assert_eq!(order, vec!["lib-bom", "other-bom"]);
        assert!(pom.property("jaxb.version").is_none());
        assert!(pom.property("other.version").is_some());
        assert!(!updated.contains("\n\n"));

        // Already in effect the second time.
        let again = mutate(&decision(&path, outcomes), false);
        assert!(again.changes.is_empty());
        assert_eq!(again.unchanged, 1);
    }

    #[test]
    fn test_mark_is_inserted_once() {
        let (_dir, path) = setup();
        let outcomes = vec![Outcome::Mark {
            text: "@NeedsReview: ordering ... details".to_string(),
            anchor: Anchor {
                profile: None,
                coordinate: coord("org.other:other-bom"),
            },
        }];
        mutate(&decision(&path, outcomes.clone()), false);
        let updated = fs::read_to_string(&path).unwrap();
        assert!(updated.contains(
            "      <!-- @NeedsReview: ordering ... details -->\n      <dependency>\n        <groupId>org.other</groupId>"
        ));

        let again = mutate(&decision(&path, outcomes), false);
        assert!(again.changes.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), updated);
    }

    #[test]
    fn test_inject_before_anchor() {
        let (_dir, path) = setup();
        let outcomes = vec![Outcome::Apply(Action::InjectManaged {
            entry: InjectedEntry {
                coordinate: coord("org.lib:lib-extras-bom"),
                version: "14.0.0".to_string(),
                kind: Some("pom".to_string()),
                scope: Some("import".to_string()),
                when_present: None,
                gate: None,
            },
            before: Some(coord("org.other:other-bom")),
        })];
        mutate(&decision(&path, outcomes), false);

        let updated = fs::read_to_string(&path).unwrap();
        let expected = [
            "      <dependency>",
            "        <groupId>org.lib</groupId>",
            "        <artifactId>lib-extras-bom</artifactId>",
            "        <version>14.0.0</version>",
            "        <type>pom</type>",
            "        <scope>import</scope>",
            "      </dependency>",
            "      <dependency>",
            "        <groupId>org.other</groupId>",
        ]
        .join("\n");
        assert!(updated.contains(&expected));
        let pom = PomDocument::parse(&updated).unwrap();
        assert_eq!(pom.managed.entries[0].coordinate.artifact_id, "lib-extras-bom");
    }

    #[test]
    fn test_inject_creates_management_section() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pom.xml");
        fs::write(&path, "<project>\n    <artifactId>a</artifactId>\n</project>\n").unwrap();
        let outcomes = vec![Outcome::Apply(Action::InjectManaged {
            entry: InjectedEntry {
                coordinate: coord("org.lib:lib-bom"),
                version: "14.0.0".to_string(),
                kind: None,
                scope: None,
                when_present: None,
                gate: None,
            },
            before: None,
        })];
        mutate(&decision(&path, outcomes), false);

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            indoc! {"
                <project>
                    <artifactId>a</artifactId>
                    <dependencyManagement>
                        <dependencies>
                            <dependency>
                                <groupId>org.lib</groupId>
                                <artifactId>lib-bom</artifactId>
                                <version>14.0.0</version>
                            </dependency>
                        </dependencies>
                    </dependencyManagement>
                </project>
            "}
        );
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let (_dir, path) = setup();
        let outcomes = vec![Outcome::Apply(Action::Reorder {
            profile: None,
            first: coord("org.lib:lib-bom"),
            second: coord("org.other:other-bom"),
        })];
        let report = mutate(&decision(&path, outcomes), true);
        assert_eq!(report.changes.len(), 1);
        assert!(!report.changes[0].written);
        assert_eq!(fs::read_to_string(&path).unwrap(), POM);
    }

    #[test]
    fn test_unparsable_descriptor_is_a_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pom.xml");
        fs::write(&path, "<project>").unwrap();
        let outcomes = vec![Outcome::Apply(Action::Reorder {
            profile: None,
            first: coord("a:b"),
            second: coord("c:d"),
        })];
        let report = mutate(&decision(&path, outcomes), false);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_indent_unit_detection() {
        assert_eq!(indent_unit("<a>\n\t<b/>\n</a>"), "\t");
        assert_eq!(indent_unit("<a>\n  <b/>\n</a>"), "  ");
        assert_eq!(indent_unit("<a/>"), "    ");
    }
}
