//! Module hierarchy of a project.
//!
//! The graph owns every [`Module`]; parents and children refer to each other
//! by [`ModuleId`]. It is built once per run by [`ModuleGraphBuilder`] and not
//! modified afterwards.

pub mod builder;
pub mod roots;

pub use builder::ModuleGraphBuilder;

use crate::descriptor::DescriptorRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub usize);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Aggregator,
    Leaf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    /// Directory relative to the project root; empty for the root module.
    pub path: PathBuf,
    pub name: String,
    pub kind: ModuleKind,
    /// `None` only for a synthetic root over descriptor-less project roots.
    pub descriptor: Option<DescriptorRef>,
    pub parent: Option<ModuleId>,
    pub children: Vec<ModuleId>,
    /// Child module directories named by the descriptor itself.
    pub declared_children: Vec<String>,
    pub main_roots: Vec<PathBuf>,
    pub test_roots: Vec<PathBuf>,
    /// Java files under the main roots (absolute paths).
    pub main_sources: Vec<PathBuf>,
    /// Java files under the test roots (absolute paths).
    pub test_sources: Vec<PathBuf>,
}

impl Module {
    pub fn is_leaf(&self) -> bool {
        self.kind == ModuleKind::Leaf
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Display path; `.` for the root.
    pub fn display_path(&self) -> String {
        if self.path.as_os_str().is_empty() {
            ".".to_string()
        } else {
            self.path.to_string_lossy().replace('\\', "/")
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleGraph {
    pub project_root: PathBuf,
    modules: Vec<Module>,
    root: Option<ModuleId>,
}

impl ModuleGraph {
    pub fn empty(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            modules: Vec::new(),
            root: None,
        }
    }

    pub(crate) fn from_parts(project_root: PathBuf, modules: Vec<Module>, root: Option<ModuleId>) -> Self {
        Self {
            project_root,
            modules,
            root,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn root(&self) -> Option<&Module> {
        self.root.map(|id| self.get(id))
    }

    pub fn get(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    pub fn find_by_path(&self, rel: &Path) -> Option<&Module> {
        self.modules.iter().find(|m| m.path == rel)
    }

    /// Absolute directory of a module.
    pub fn module_dir(&self, id: ModuleId) -> PathBuf {
        self.project_root.join(&self.get(id).path)
    }

    /// Chain from `id` up to the project root, `id` first.
    pub fn ancestors(&self, id: ModuleId) -> Vec<ModuleId> {
        std::iter::successors(Some(id), |current| self.get(*current).parent).collect()
    }

    /// Modules in parent-before-child order.
    pub fn top_down(&self) -> Vec<ModuleId> {
        let mut order = Vec::with_capacity(self.modules.len());
        let mut stack: Vec<ModuleId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.get(id).children.iter().rev().copied());
        }
        order
    }

    /// Leaf modules with main sources; test-only modules are excluded.
    pub fn is_placement_target(&self, id: ModuleId) -> bool {
        let module = self.get(id);
        module.is_leaf() && !module.main_sources.is_empty()
    }
}
