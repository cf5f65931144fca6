use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Directories that never hold project sources or descriptors.
pub const SKIPPED_DIRS: [&str; 6] = ["target", "build", "out", ".git", ".gradle", "node_modules"];

pub struct ProjectWalker {
    root: PathBuf,
    ignore_patterns: Vec<String>,
}

impl ProjectWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ignore_patterns: vec![],
        }
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Every regular file under the root, sorted for deterministic output.
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .filter_entry(|entry| {
                !(entry.file_type().is_some_and(|t| t.is_dir())
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| SKIPPED_DIRS.contains(&name)))
            })
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && self.should_process(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    fn should_process(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let path_str = relative.to_string_lossy();
        !self.ignore_patterns.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(&path_str))
                .unwrap_or(false)
        })
    }
}

pub fn find_project_files(root: &Path, ignore_patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    ProjectWalker::new(root.to_path_buf())
        .with_ignore_patterns(ignore_patterns)
        .walk()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_skips_build_output_and_hidden() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "pom.xml");
        touch(dir.path(), "src/main/java/A.java");
        touch(dir.path(), "target/classes/A.class");
        touch(dir.path(), ".idea/workspace.xml");

        let files = find_project_files(dir.path(), vec![]).unwrap();
        let rel: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            rel,
            vec![PathBuf::from("pom.xml"), PathBuf::from("src/main/java/A.java")]
        );
    }

    #[test]
    fn test_ignore_patterns_are_relative_globs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "legacy/pom.xml");
        touch(dir.path(), "app/pom.xml");

        let files = find_project_files(dir.path(), vec!["legacy/**".to_string()]).unwrap();
        assert_eq!(files, vec![dir.path().join("app/pom.xml")]);
    }
}
