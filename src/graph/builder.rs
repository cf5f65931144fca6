//! Discovery of module boundaries from the descriptor forest.

use super::roots::{resolve_layout, DeclaredRoots};
use super::{Module, ModuleGraph, ModuleId, ModuleKind};
use crate::descriptor::gradle::{parse_settings_includes, BUILD_SCRIPTS, SETTINGS_SCRIPTS};
use crate::descriptor::{DescriptorKind, DescriptorRef, PomDocument, POM_FILE};
use crate::io::walker::ProjectWalker;
use anyhow::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct ModuleGraphBuilder {
    root: PathBuf,
    ignore_patterns: Vec<String>,
}

/// Structure read from a descriptor while building the graph.
#[derive(Debug, Default)]
struct DescriptorOutline {
    name: Option<String>,
    declared_children: Vec<String>,
    declared_roots: DeclaredRoots,
}

impl ModuleGraphBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore_patterns: vec![],
        }
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn build(&self) -> Result<ModuleGraph> {
        let files = ProjectWalker::new(self.root.clone())
            .with_ignore_patterns(self.ignore_patterns.clone())
            .walk()?;
        Ok(self.build_from_files(&files))
    }

    /// Build the graph from an already enumerated file list.
    pub fn build_from_files(&self, files: &[PathBuf]) -> ModuleGraph {
        let candidates = descriptor_dirs(&self.root, files);
        if candidates.is_empty() {
            debug!("No build descriptors under {}", self.root.display());
            return ModuleGraph::empty(self.root.clone());
        }

        // Every candidate plus a synthetic root when the project root has none.
        let mut dirs: BTreeMap<PathBuf, Option<DescriptorRef>> = candidates
            .into_iter()
            .map(|(dir, d)| (dir, Some(d)))
            .collect();
        dirs.entry(PathBuf::new()).or_insert(None);

        let ids: BTreeMap<PathBuf, ModuleId> = dirs
            .keys()
            .enumerate()
            .map(|(i, dir)| (dir.clone(), ModuleId(i)))
            .collect();

        let owned = assign_files(&self.root, files, &ids);

        let mut modules: Vec<Module> = dirs
            .iter()
            .map(|(dir, descriptor)| {
                let id = ids[dir];
                let outline = descriptor
                    .as_ref()
                    .map(|d| read_outline(d, &self.root.join(dir)))
                    .unwrap_or_default();
                let module_dir = self.root.join(dir);
                let layout = resolve_layout(
                    &module_dir,
                    owned.get(&id).map(Vec::as_slice).unwrap_or_default(),
                    &outline.declared_roots,
                    |p| fs::read_to_string(p).ok(),
                );

                Module {
                    id,
                    path: dir.clone(),
                    name: outline
                        .name
                        .or_else(|| dir_name(&module_dir))
                        .unwrap_or_else(|| "root".to_string()),
                    kind: ModuleKind::Leaf,
                    descriptor: descriptor.clone(),
                    parent: nearest_candidate(dir, &ids),
                    children: Vec::new(),
                    declared_children: outline.declared_children,
                    main_roots: layout.main_roots,
                    test_roots: layout.test_roots,
                    main_sources: layout.main_sources,
                    test_sources: layout.test_sources,
                }
            })
            .collect();

        let links: Vec<(ModuleId, ModuleId)> = modules
            .iter()
            .filter_map(|m| m.parent.map(|p| (p, m.id)))
            .collect();
        for (parent, child) in links {
            modules[parent.0].children.push(child);
        }

        for module in &mut modules {
            warn_on_missing_children(module, &ids);
            // Only the synthetic root aggregates the children found on disk.
            let has_children = !module.declared_children.is_empty()
                || (module.descriptor.is_none() && !module.children.is_empty());
            if has_children && module.main_roots.is_empty() {
                module.kind = ModuleKind::Aggregator;
            }
        }

        let root = ids.get(Path::new("")).copied();
        ModuleGraph::from_parts(self.root.clone(), modules, root)
    }
}

/// Directories holding a descriptor, relative to the project root. A Gradle
/// script only counts when the directory has no `pom.xml`.
fn descriptor_dirs(root: &Path, files: &[PathBuf]) -> BTreeMap<PathBuf, DescriptorRef> {
    let mut dirs: BTreeMap<PathBuf, DescriptorRef> = BTreeMap::new();
    for file in files {
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let kind = if name == POM_FILE {
            DescriptorKind::Maven
        } else if BUILD_SCRIPTS.contains(&name) {
            DescriptorKind::Gradle
        } else {
            continue;
        };
        let Some(dir) = file.parent().and_then(|d| d.strip_prefix(root).ok()) else {
            continue;
        };
        let candidate = DescriptorRef {
            kind,
            path: file.clone(),
        };
        match dirs.get(dir) {
            Some(existing) if existing.kind == DescriptorKind::Maven => {}
            Some(existing) if existing.path <= candidate.path && kind == DescriptorKind::Gradle => {}
            _ => {
                dirs.insert(dir.to_path_buf(), candidate);
            }
        }
    }
    dirs
}

/// Closest enclosing module directory of `dir`, excluding `dir` itself.
fn nearest_candidate(dir: &Path, ids: &BTreeMap<PathBuf, ModuleId>) -> Option<ModuleId> {
    if dir.as_os_str().is_empty() {
        return None;
    }
    dir.ancestors().skip(1).find_map(|a| ids.get(a).copied())
}

/// Each file belongs to the deepest module directory containing it.
fn assign_files(
    root: &Path,
    files: &[PathBuf],
    ids: &BTreeMap<PathBuf, ModuleId>,
) -> BTreeMap<ModuleId, Vec<PathBuf>> {
    let mut owned: BTreeMap<ModuleId, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        let Ok(rel) = file.strip_prefix(root) else {
            continue;
        };
        if let Some(id) = rel.ancestors().skip(1).find_map(|a| ids.get(a).copied()) {
            owned.entry(id).or_default().push(file.clone());
        }
    }
    owned
}

fn read_outline(descriptor: &DescriptorRef, module_dir: &Path) -> DescriptorOutline {
    match descriptor.kind {
        DescriptorKind::Maven => read_pom_outline(&descriptor.path),
        DescriptorKind::Gradle => DescriptorOutline {
            name: None,
            declared_children: SETTINGS_SCRIPTS
                .iter()
                .map(|name| module_dir.join(name))
                .find(|p| p.is_file())
                .and_then(|p| fs::read_to_string(p).ok())
                .map(|text| parse_settings_includes(&text))
                .unwrap_or_default(),
            declared_roots: DeclaredRoots::default(),
        },
    }
}

fn read_pom_outline(path: &Path) -> DescriptorOutline {
    let parsed = fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|text| PomDocument::parse(&text).map_err(anyhow::Error::from));

    match parsed {
        Ok(pom) => DescriptorOutline {
            name: pom.coordinate.map(|c| c.artifact_id),
            declared_children: pom.modules,
            declared_roots: DeclaredRoots {
                main: pom.source_directory,
                test: pom.test_source_directory,
            },
        },
        Err(e) => {
            // Reported as a parse failure by the scan pass.
            debug!("Descriptor outline unavailable for {}: {}", path.display(), e);
            DescriptorOutline::default()
        }
    }
}

fn warn_on_missing_children(module: &Module, ids: &BTreeMap<PathBuf, ModuleId>) {
    for declared in &module.declared_children {
        let child = normalize(&module.path.join(declared));
        if !ids.contains_key(&child) {
            warn!(
                "Module {} declares child '{}' but no descriptor was found there",
                module.display_path(),
                declared
            );
        }
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn dir_name(dir: &Path) -> Option<String> {
    dir.file_name().map(|n| n.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::roots::MAIN_CODE;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn pom(artifact: &str, modules: &[&str]) -> String {
        let modules: String = modules
            .iter()
            .map(|m| format!("<module>{}</module>", m))
            .collect();
        format!(
            "<project><groupId>org.acme</groupId><artifactId>{}</artifactId><modules>{}</modules></project>",
            artifact, modules
        )
    }

    #[test]
    fn test_empty_project_yields_empty_graph() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "hello");
        let graph = ModuleGraphBuilder::new(dir.path()).build().unwrap();
        assert!(graph.is_empty());
        assert!(graph.root().is_none());
    }

    #[test]
    fn test_aggregator_and_leaves() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pom.xml", &pom("parent", &["api", "impl"]));
        write(dir.path(), "api/pom.xml", &pom("api", &[]));
        write(dir.path(), "api/src/main/java/org/acme/api/Api.java", "package org.acme.api;\npublic interface Api {}");
        write(dir.path(), "impl/pom.xml", &pom("impl", &[]));
        write(dir.path(), "impl/src/test/java/org/acme/ImplTest.java", "package org.acme;\nclass ImplTest {}");

        let graph = ModuleGraphBuilder::new(dir.path()).build().unwrap();
        assert_eq!(graph.len(), 3);

        let root = graph.root().unwrap();
        assert_eq!(root.kind, ModuleKind::Aggregator);
        assert_eq!(root.name, "parent");
        assert_eq!(root.children.len(), 2);

        let api = graph.find_by_path(Path::new("api")).unwrap();
        assert_eq!(api.kind, ModuleKind::Leaf);
        assert_eq!(api.main_roots, vec![PathBuf::from(MAIN_CODE)]);
        assert_eq!(api.parent, Some(root.id));
        assert!(graph.is_placement_target(api.id));

        let imp = graph.find_by_path(Path::new("impl")).unwrap();
        assert_eq!(imp.kind, ModuleKind::Leaf);
        assert!(!graph.is_placement_target(imp.id));

        assert_eq!(graph.ancestors(api.id), vec![api.id, root.id]);
    }

    #[test]
    fn test_undeclared_children_do_not_make_an_aggregator() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pom.xml", &pom("parent", &[]));
        write(dir.path(), "lib/pom.xml", &pom("lib", &[]));

        let graph = ModuleGraphBuilder::new(dir.path()).build().unwrap();
        let root = graph.root().unwrap();
        assert_eq!(root.children.len(), 1);
        assert!(root.declared_children.is_empty());
        assert_eq!(root.kind, ModuleKind::Leaf);
    }

    #[test]
    fn test_nested_module_files_are_not_shared() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pom.xml", &pom("app", &["plugin"]));
        write(dir.path(), "src/main/java/a/App.java", "package a;\nclass App {}");
        write(dir.path(), "plugin/pom.xml", &pom("plugin", &[]));
        write(dir.path(), "plugin/src/main/java/b/Plugin.java", "package b;\nclass Plugin {}");

        let graph = ModuleGraphBuilder::new(dir.path()).build().unwrap();
        let root = graph.root().unwrap();
        assert_eq!(root.kind, ModuleKind::Leaf);
        assert_eq!(root.main_sources.len(), 1);
        let plugin = graph.find_by_path(Path::new("plugin")).unwrap();
        assert_eq!(plugin.main_sources.len(), 1);
    }

    #[test]
    fn test_gradle_only_when_no_pom() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "settings.gradle", "include ':lib'");
        write(dir.path(), "build.gradle", "");
        write(dir.path(), "lib/build.gradle", "");
        write(dir.path(), "lib/pom.xml", &pom("lib", &[]));

        let graph = ModuleGraphBuilder::new(dir.path()).build().unwrap();
        let root = graph.root().unwrap();
        assert_eq!(root.descriptor.as_ref().unwrap().kind, DescriptorKind::Gradle);
        assert_eq!(root.declared_children, vec!["lib".to_string()]);
        let lib = graph.find_by_path(Path::new("lib")).unwrap();
        assert_eq!(lib.descriptor.as_ref().unwrap().kind, DescriptorKind::Maven);
    }

    #[test]
    fn test_synthetic_root_over_descriptorless_directory() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/pom.xml", &pom("a", &[]));
        write(dir.path(), "b/pom.xml", &pom("b", &[]));

        let graph = ModuleGraphBuilder::new(dir.path()).build().unwrap();
        let root = graph.root().unwrap();
        assert!(root.descriptor.is_none());
        assert_eq!(root.kind, ModuleKind::Aggregator);
        assert_eq!(root.children.len(), 2);
        assert_eq!(graph.top_down()[0], root.id);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
    }
}
