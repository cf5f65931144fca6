pub mod output;
pub mod walker;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Replace `path` with `contents` through a sibling temp file and a rename,
/// so readers never observe a partially written file.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let tmp = temp_path(path);
    if let Err(err) = fs::write(&tmp, contents).and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.depshift-tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pom.xml");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!dir.path().join(".pom.xml.depshift-tmp").exists());
    }

    #[test]
    fn test_write_atomic_into_missing_dir_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("pom.xml");
        assert!(write_atomic(&path, "x").is_err());
        assert!(!path.exists());
    }
}
