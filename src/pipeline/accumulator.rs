//! Insert-once fact store filled by the scan pass.
//!
//! Every scanned file writes under its own [`FactKey`], so parallel writers
//! never contend for the same entry. Once scanning has joined, the store is
//! frozen into a read-only [`FactStore`] grouped by module; deciding only
//! ever sees the frozen form.

use crate::descriptor::{Coordinate, DescriptorKind, Section};
use crate::graph::ModuleId;
use crate::source::Declaration;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which part of a module a fact describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Descriptor,
    /// A descriptor profile, by id. Profile ids repeat across modules, so
    /// they are always paired with the module.
    Profile(String),
    Source(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactKey {
    pub module: ModuleId,
    pub scope: Scope,
}

impl FactKey {
    pub fn descriptor(module: ModuleId) -> Self {
        Self {
            module,
            scope: Scope::Descriptor,
        }
    }

    pub fn profile(module: ModuleId, id: impl Into<String>) -> Self {
        Self {
            module,
            scope: Scope::Profile(id.into()),
        }
    }

    pub fn source(module: ModuleId, path: impl Into<PathBuf>) -> Self {
        Self {
            module,
            scope: Scope::Source(path.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyFact {
    pub coordinate: Coordinate,
    /// Version as written, placeholders included.
    pub version: Option<String>,
    pub section: Section,
    /// 0-based position within its section.
    pub ordinal: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentFact {
    pub coordinate: Coordinate,
    pub version: Option<String>,
}

/// Facts read from a descriptor, or from one of its profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorFacts {
    pub path: PathBuf,
    pub kind: DescriptorKind,
    pub dependencies: Vec<DependencyFact>,
    pub managed: Vec<DependencyFact>,
    pub properties: BTreeMap<String, String>,
    /// Number of `${name}` references in the whole file.
    pub property_usage: BTreeMap<String, usize>,
    pub parent: Option<ParentFact>,
    /// Review comments already present in the file.
    pub markers: BTreeSet<String>,
}

impl DescriptorFacts {
    pub fn new(path: impl Into<PathBuf>, kind: DescriptorKind) -> Self {
        Self {
            path: path.into(),
            kind,
            dependencies: Vec::new(),
            managed: Vec::new(),
            properties: BTreeMap::new(),
            property_usage: BTreeMap::new(),
            parent: None,
            markers: BTreeSet::new(),
        }
    }

    pub fn section(&self, section: Section) -> &[DependencyFact] {
        match section {
            Section::Dependencies => &self.dependencies,
            Section::DependencyManagement => &self.managed,
        }
    }

    pub fn find(&self, section: Section, coordinate: &Coordinate) -> Option<&DependencyFact> {
        self.section(section)
            .iter()
            .find(|d| &d.coordinate == coordinate)
    }

    pub fn declares(&self, coordinate: &Coordinate) -> bool {
        self.find(Section::Dependencies, coordinate).is_some()
            || self.find(Section::DependencyManagement, coordinate).is_some()
    }

    pub fn is_editable(&self) -> bool {
        self.kind == DescriptorKind::Maven
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFacts {
    pub package: Option<String>,
    pub declarations: Vec<Declaration>,
    pub test: bool,
    /// A declaration here already plays the generated artifact's role.
    pub has_marker: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Facts {
    Descriptor(DescriptorFacts),
    Source(SourceFacts),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("facts for module {} ({:?}) were already recorded", .0.module, .0.scope)]
pub struct AlreadyRecorded(pub FactKey);

#[derive(Debug, Default)]
pub struct Accumulator {
    facts: DashMap<FactKey, Facts>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record facts under `key`. A key is written at most once per run.
    pub fn record(&self, key: FactKey, facts: Facts) -> Result<(), AlreadyRecorded> {
        match self.facts.entry(key) {
            Entry::Occupied(existing) => Err(AlreadyRecorded(existing.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(facts);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Close the store; only the returned read-only view remains.
    pub fn freeze(self) -> FactStore {
        let mut modules: HashMap<ModuleId, ModuleFacts> = HashMap::new();
        for (key, facts) in self.facts {
            let module = modules.entry(key.module).or_default();
            match (key.scope, facts) {
                (Scope::Descriptor, Facts::Descriptor(d)) => module.descriptor = Some(d),
                (Scope::Profile(id), Facts::Descriptor(d)) => {
                    module.profiles.insert(id, d);
                }
                (Scope::Source(path), Facts::Source(s)) => {
                    module.sources.insert(path, s);
                }
                (scope, _) => {
                    tracing::warn!("Discarding mismatched facts for {:?}", scope);
                }
            }
        }
        FactStore { modules }
    }
}

/// Everything known about one module after scanning.
#[derive(Debug, Clone, Default)]
pub struct ModuleFacts {
    pub descriptor: Option<DescriptorFacts>,
    pub profiles: BTreeMap<String, DescriptorFacts>,
    pub sources: BTreeMap<PathBuf, SourceFacts>,
}

impl ModuleFacts {
    pub fn main_sources(&self) -> impl Iterator<Item = (&Path, &SourceFacts)> {
        self.sources
            .iter()
            .filter(|(_, s)| !s.test)
            .map(|(p, s)| (p.as_path(), s))
    }

    /// Descriptor facts of a profile, or of the descriptor itself for `None`.
    pub fn scope(&self, profile: Option<&str>) -> Option<&DescriptorFacts> {
        match profile {
            None => self.descriptor.as_ref(),
            Some(id) => self.profiles.get(id),
        }
    }
}

/// Read-only facts, available once scanning is complete.
#[derive(Debug, Clone, Default)]
pub struct FactStore {
    modules: HashMap<ModuleId, ModuleFacts>,
}

impl FactStore {
    pub fn module(&self, id: ModuleId) -> Option<&ModuleFacts> {
        self.modules.get(&id)
    }

    pub fn descriptor(&self, id: ModuleId) -> Option<&DescriptorFacts> {
        self.module(id).and_then(|m| m.descriptor.as_ref())
    }
}
