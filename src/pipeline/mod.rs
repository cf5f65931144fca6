//! Scan → Decide → Mutate.
//!
//! A run reads every descriptor and Java file once into an insert-once
//! [`Accumulator`], freezes it, decides per module what to do, and then
//! applies the decisions with one atomic rewrite per touched file.

pub mod accumulator;
pub mod decide;
pub mod marker;
pub mod mutate;
pub mod outcome;
pub mod scan;
pub mod stage;
pub mod state;

pub use accumulator::{Accumulator, FactKey, FactStore, Facts, Scope};
pub use mutate::FileChange;
pub use outcome::{Action, ModuleDecision, Outcome, OutcomeKind, PlannedOutcome};
pub use stage::{run_stage, DecideStage, MutateStage, ScanStage, Stage};
pub use state::RunState;

use crate::config::{
    load_module_layers, load_project_config, ConfigurationConflict, DepshiftConfig,
    HierarchicalResolver,
};
use crate::errors::{DepshiftError, FileFailure};
use crate::graph::{ModuleGraph, ModuleGraphBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub root: PathBuf,
    /// Explicit project configuration file.
    pub config_path: Option<PathBuf>,
    /// `key=value` settings applied as process defaults.
    pub overrides: Vec<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub skip: usize,
    pub mark: usize,
    pub apply: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub root: PathBuf,
    pub dry_run: bool,
    pub state: RunState,
    pub modules: usize,
    pub files_scanned: usize,
    pub counts: OutcomeCounts,
    pub decisions: Vec<ModuleDecision>,
    pub changes: Vec<FileChange>,
    /// Files whose planned outcomes were already in effect.
    pub unchanged_files: usize,
    pub failures: Vec<FileFailure>,
    pub notes: Vec<String>,
}

impl RunSummary {
    pub fn files_changed(&self) -> usize {
        self.changes.len()
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Load configuration, build the module graph, and run all passes.
pub fn run_pipeline(options: &RunOptions) -> Result<RunSummary, DepshiftError> {
    let root = check_root(&options.root)?;
    let mut config = load_project_config(&root, options.config_path.as_deref())?;
    for assignment in &options.overrides {
        config
            .defaults
            .apply_override(assignment)
            .map_err(|message| DepshiftError::InvalidOverride {
                assignment: assignment.clone(),
                message,
            })?;
    }

    let graph = ModuleGraphBuilder::new(&root)
        .with_ignore_patterns(config.get_ignore_patterns())
        .build()
        .map_err(DepshiftError::Graph)?;
    info!("Found {} module(s) under {}", graph.len(), root.display());

    run_with_graph(&graph, &config, options.dry_run)
}

/// Run all passes over an already built graph.
pub fn run_with_graph(
    graph: &ModuleGraph,
    config: &DepshiftConfig,
    dry_run: bool,
) -> Result<RunSummary, DepshiftError> {
    let layers = load_module_layers(graph);
    let settings = HierarchicalResolver::new(graph, config.defaults.clone()).resolve_all(&layers);

    let mut state = RunState::Initialized;
    let (facts, scan) = run_stage(&mut state, &ScanStage { graph, config }, Accumulator::new())?;
    let decisions = run_stage(
        &mut state,
        &DecideStage {
            graph,
            settings: &settings,
            config,
        },
        &facts,
    )?;
    let (decisions, mutation) = run_stage(&mut state, &MutateStage { dry_run }, decisions)?;
    state.advance(RunState::Done)?;

    let mut counts = OutcomeCounts::default();
    for decision in &decisions {
        counts.skip += decision.count(OutcomeKind::Skip);
        counts.mark += decision.count(OutcomeKind::Mark);
        counts.apply += decision.count(OutcomeKind::Apply);
    }

    let mut notes: Vec<String> = settings
        .conflicts
        .iter()
        .map(|c| conflict_note(graph, c))
        .collect();
    notes.extend(config.unknown_gates().into_iter().map(|gate| {
        format!("rules gated on '{}' never apply: no tracked dependency has that name", gate)
    }));

    let mut failures = scan.failures;
    failures.extend(mutation.failures);
    failures.sort_by(|a, b| a.path.cmp(&b.path));

    info!(
        "Run finished: {} skip, {} mark, {} apply, {} file(s) changed",
        counts.skip,
        counts.mark,
        counts.apply,
        mutation.changes.len()
    );

    Ok(RunSummary {
        root: graph.project_root.clone(),
        dry_run,
        state,
        modules: graph.len(),
        files_scanned: scan.files_scanned,
        counts,
        decisions,
        changes: mutation.changes,
        unchanged_files: mutation.unchanged,
        failures,
        notes,
    })
}

fn check_root(root: &Path) -> Result<PathBuf, DepshiftError> {
    if !root.exists() {
        return Err(DepshiftError::RootMissing(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(DepshiftError::RootNotDirectory(root.to_path_buf()));
    }
    Ok(root.canonicalize().unwrap_or_else(|_| root.to_path_buf()))
}

fn conflict_note(graph: &ModuleGraph, conflict: &ConfigurationConflict) -> String {
    format!(
        "{} sets {} = {}, overriding {} from {}",
        graph.get(conflict.module).display_path(),
        conflict.key,
        conflict.module_value,
        conflict.ancestor_value,
        graph.get(conflict.ancestor).display_path()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_root_is_a_setup_failure() {
        let options = RunOptions {
            root: PathBuf::from("/definitely/not/here"),
            ..Default::default()
        };
        assert!(matches!(run_pipeline(&options), Err(DepshiftError::RootMissing(_))));
    }

    #[test]
    fn test_file_root_is_a_setup_failure() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("pom.xml");
        std::fs::write(&file, "<project/>").unwrap();
        let options = RunOptions {
            root: file,
            ..Default::default()
        };
        assert!(matches!(run_pipeline(&options), Err(DepshiftError::RootNotDirectory(_))));
    }

    #[test]
    fn test_empty_project_completes() {
        let dir = TempDir::new().unwrap();
        let summary = run_pipeline(&RunOptions {
            root: dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(summary.modules, 0);
        assert_eq!(summary.state, RunState::Done);
        assert!(!summary.has_changes());
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = run_pipeline(&RunOptions {
            root: dir.path().to_path_buf(),
            overrides: vec!["generate=sometimes".to_string()],
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, DepshiftError::InvalidOverride { .. }));
    }
}
