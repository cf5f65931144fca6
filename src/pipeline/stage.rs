//! Stages of a run.
//!
//! Each stage owns one [`RunState`] and consumes the previous stage's
//! output. [`run_stage`] moves the run into the stage's state before
//! executing it, so stages can only run once and in order.

use super::accumulator::{Accumulator, FactStore};
use super::decide::{decide_all, DecideContext};
use super::mutate::{mutate, MutationReport};
use super::outcome::ModuleDecision;
use super::scan::{scan_project, ScanReport};
use super::state::{InvalidTransition, RunState};
use crate::config::{DepshiftConfig, ResolvedSettings};
use crate::graph::ModuleGraph;
use tracing::info_span;

pub trait Stage {
    type Input;
    type Output;

    fn execute(&self, input: Self::Input) -> Self::Output;

    /// Stage name for logging.
    fn name(&self) -> &str;

    /// State the run is in while this stage executes.
    fn state(&self) -> RunState;
}

/// Advance `state` into the stage's state and execute it.
pub fn run_stage<S: Stage>(
    state: &mut RunState,
    stage: &S,
    input: S::Input,
) -> Result<S::Output, InvalidTransition> {
    state.advance(stage.state())?;
    let span = info_span!("stage", name = stage.name());
    let _guard = span.enter();
    Ok(stage.execute(input))
}

pub struct ScanStage<'a> {
    pub graph: &'a ModuleGraph,
    pub config: &'a DepshiftConfig,
}

impl Stage for ScanStage<'_> {
    type Input = Accumulator;
    type Output = (FactStore, ScanReport);

    /// Scans every file, then freezes the accumulator. Nothing downstream
    /// sees facts before all scanning threads have joined.
    fn execute(&self, acc: Accumulator) -> Self::Output {
        let report = scan_project(self.graph, &self.config.generation, &acc);
        (acc.freeze(), report)
    }

    fn name(&self) -> &str {
        "scan"
    }

    fn state(&self) -> RunState {
        RunState::Scanning
    }
}

pub struct DecideStage<'a> {
    pub graph: &'a ModuleGraph,
    pub settings: &'a ResolvedSettings,
    pub config: &'a DepshiftConfig,
}

impl<'a> Stage for DecideStage<'a> {
    type Input = &'a FactStore;
    type Output = Vec<ModuleDecision>;

    fn execute(&self, facts: &'a FactStore) -> Self::Output {
        decide_all(&DecideContext {
            graph: self.graph,
            facts,
            settings: self.settings,
            config: self.config,
        })
    }

    fn name(&self) -> &str {
        "decide"
    }

    fn state(&self) -> RunState {
        RunState::Deciding
    }
}

pub struct MutateStage {
    pub dry_run: bool,
}

impl Stage for MutateStage {
    type Input = Vec<ModuleDecision>;
    type Output = (Vec<ModuleDecision>, MutationReport);

    fn execute(&self, decisions: Vec<ModuleDecision>) -> Self::Output {
        let report = mutate(&decisions, self.dry_run);
        (decisions, report)
    }

    fn name(&self) -> &str {
        "mutate"
    }

    fn state(&self) -> RunState {
        RunState::Mutating
    }
}
