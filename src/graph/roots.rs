//! Source root resolution for one module.
//!
//! Conventional Maven roots are tried first. When a conventional code root
//! holds no Java file, roots are derived from where Java files actually live:
//! the file's directory with its package path removed. Only `.java` files
//! take part, so resources or generated files never move a root.

use crate::source::{is_java_file, package_of};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

pub const MAIN_CODE: &str = "src/main/java";
pub const MAIN_RESOURCES: &str = "src/main/resources";
pub const TEST_CODE: &str = "src/test/java";
pub const TEST_RESOURCES: &str = "src/test/resources";

/// Explicit code roots declared by a descriptor (`<sourceDirectory>`).
#[derive(Debug, Clone, Default)]
pub struct DeclaredRoots {
    pub main: Option<String>,
    pub test: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLayout {
    pub main_roots: Vec<PathBuf>,
    pub test_roots: Vec<PathBuf>,
    pub main_sources: Vec<PathBuf>,
    pub test_sources: Vec<PathBuf>,
}

/// Resolve the layout of the module at `module_dir` from the files it owns.
///
/// `files` are absolute paths already restricted to this module (files of
/// nested modules excluded). `read` returns file contents for package lookup.
pub fn resolve_layout<F>(
    module_dir: &Path,
    files: &[PathBuf],
    declared: &DeclaredRoots,
    read: F,
) -> SourceLayout
where
    F: Fn(&Path) -> Option<String>,
{
    let relative: Vec<(PathBuf, &PathBuf)> = files
        .iter()
        .filter_map(|f| f.strip_prefix(module_dir).ok().map(|r| (r.to_path_buf(), f)))
        .collect();

    let java: Vec<&(PathBuf, &PathBuf)> = relative.iter().filter(|(r, _)| is_java_file(r)).collect();
    let main_explicit = explicit_root(declared.main.as_deref(), MAIN_CODE);
    let test_explicit = explicit_root(declared.test.as_deref(), TEST_CODE);
    let (test_java, main_java): (Vec<_>, Vec<_>) = java
        .into_iter()
        .partition(|(r, _)| is_test_file(r, &main_explicit, &test_explicit));

    let main_code = code_roots(main_explicit, &main_java, &read);
    let test_code = code_roots(test_explicit, &test_java, &read);

    let mut main_roots = main_code.clone();
    if has_file_under(&relative, Path::new(MAIN_RESOURCES)) {
        main_roots.push(PathBuf::from(MAIN_RESOURCES));
    }
    let mut test_roots = test_code.clone();
    if has_file_under(&relative, Path::new(TEST_RESOURCES)) {
        test_roots.push(PathBuf::from(TEST_RESOURCES));
    }

    SourceLayout {
        main_sources: files_under(&main_java, &main_code),
        test_sources: files_under(&test_java, &test_code),
        main_roots,
        test_roots,
    }
}

/// The declared root when it is literal, else the conventional one.
fn explicit_root(declared: Option<&str>, conventional: &str) -> PathBuf {
    declared
        .filter(|d| !d.contains("${"))
        .map(|d| PathBuf::from(d.trim_start_matches("./")))
        .unwrap_or_else(|| PathBuf::from(conventional))
}

/// Files under the main or test root belong to it; only files outside both
/// fall back to the directory-name heuristic.
fn is_test_file(rel: &Path, main_root: &Path, test_root: &Path) -> bool {
    if rel.starts_with(main_root) {
        false
    } else if rel.starts_with(test_root) {
        true
    } else {
        is_test_path(rel)
    }
}

fn code_roots<F>(explicit: PathBuf, java: &[&(PathBuf, &PathBuf)], read: &F) -> Vec<PathBuf>
where
    F: Fn(&Path) -> Option<String>,
{
    if java.iter().any(|(r, _)| r.starts_with(&explicit)) {
        return vec![explicit];
    }

    let detected: BTreeSet<PathBuf> = java
        .iter()
        .map(|(rel, abs)| derive_root(rel, read(abs).and_then(|t| package_of(&t)).as_deref()))
        .collect();
    detected.into_iter().collect()
}

/// Directory of `rel` with the package path removed from its end.
pub fn derive_root(rel: &Path, package: Option<&str>) -> PathBuf {
    let dir = rel.parent().unwrap_or(Path::new("")).to_path_buf();
    let Some(package) = package else {
        return dir;
    };
    let package_path: PathBuf = package.split('.').collect();
    if !dir.ends_with(&package_path) {
        return dir;
    }
    let keep = dir.components().count() - package_path.components().count();
    dir.components().take(keep).collect()
}

/// Paths with a `test` or `tests` directory component are test code.
pub fn is_test_path(rel: &Path) -> bool {
    rel.parent().is_some_and(|dir| {
        dir.components().any(|c| match c {
            Component::Normal(name) => name == "test" || name == "tests",
            _ => false,
        })
    })
}

fn has_file_under(files: &[(PathBuf, &PathBuf)], root: &Path) -> bool {
    files.iter().any(|(r, _)| r.starts_with(root))
}

fn files_under(java: &[&(PathBuf, &PathBuf)], roots: &[PathBuf]) -> Vec<PathBuf> {
    java.iter()
        .filter(|(r, _)| roots.iter().any(|root| r.starts_with(root)))
        .map(|(_, abs)| abs.to_path_buf())
        .collect()
}
