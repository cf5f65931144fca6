//! Decisions handed from the decide pass to the mutate pass.

use crate::config::InjectedEntry;
use crate::descriptor::Coordinate;
use crate::placement::PlacementDecision;
use crate::version::VersionVerdict;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// What happens to one rule in one module. Skip wins over Mark, Mark over Apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Leave content untouched.
    Skip { reason: String },
    /// Leave structure untouched and add a review comment above `anchor`.
    Mark { text: String, anchor: Anchor },
    /// Perform a safe, deterministic edit.
    Apply(Action),
}

impl Outcome {
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skip {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Skip { .. } => OutcomeKind::Skip,
            Self::Mark { .. } => OutcomeKind::Mark,
            Self::Apply(_) => OutcomeKind::Apply,
        }
    }

    /// True when mutation has something to do for this outcome.
    pub fn touches_file(&self) -> bool {
        !matches!(self, Self::Skip { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Skip,
    Mark,
    Apply,
}

/// A dependency element inside a descriptor, located by profile and coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anchor {
    pub profile: Option<String>,
    pub coordinate: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Exchange two managed entries so `first` precedes `second`.
    Reorder {
        profile: Option<String>,
        first: Coordinate,
        second: Coordinate,
    },
    /// Delete a managed entry, and properties only it referenced.
    RemoveManaged {
        profile: Option<String>,
        coordinate: Coordinate,
        unused_properties: Vec<String>,
    },
    /// Add a managed entry, above `before` when given, else at the end.
    InjectManaged {
        entry: InjectedEntry,
        before: Option<Coordinate>,
    },
    /// Create the scan configuration artifact.
    Generate {
        placement: PlacementDecision,
        #[serde(skip)]
        content: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedOutcome {
    /// File the outcome applies to (a descriptor, or the artifact to create).
    pub file: PathBuf,
    pub topic: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Everything decided for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDecision {
    pub module: String,
    pub verdicts: BTreeMap<String, VersionVerdict>,
    pub outcomes: Vec<PlannedOutcome>,
}

impl ModuleDecision {
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.outcome.kind() == kind)
            .count()
    }
}
