use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::DepshiftConfig;
use crate::errors::DepshiftError;

pub const PROJECT_CONFIG_FILE: &str = "depshift.toml";

/// Read a configuration file into a string.
pub(crate) fn read_config_file(path: &Path) -> Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse `depshift.toml` contents and check its thresholds.
pub fn parse_and_validate_config(contents: &str) -> Result<DepshiftConfig, String> {
    let config = toml::from_str::<DepshiftConfig>(contents)
        .map_err(|e| format!("failed to parse {}: {}", PROJECT_CONFIG_FILE, e))?;

    for tracked in &config.tracked {
        if !tracked.thresholds().is_well_formed() {
            return Err(format!(
                "tracked dependency '{}' has lower bound {} above upper bound {}",
                tracked.name, tracked.lower, tracked.upper
            ));
        }
    }

    let mut names: Vec<&str> = config.tracked.iter().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    if let Some(pair) = names.windows(2).find(|w| w[0] == w[1]) {
        return Err(format!("tracked dependency '{}' is defined twice", pair[0]));
    }

    for gate in config.unknown_gates() {
        log::warn!("Rule gated on unknown tracked dependency '{}'; it will never apply", gate);
    }

    Ok(config)
}

/// Log unexpected read failures; a missing file is not an error.
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Load the project configuration.
///
/// An explicit path must exist and parse. Otherwise `depshift.toml` at the
/// project root is used when present, and built-in defaults when not.
pub fn load_project_config(
    root: &Path,
    explicit: Option<&Path>,
) -> Result<DepshiftConfig, DepshiftError> {
    let (path, required): (PathBuf, bool) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (root.join(PROJECT_CONFIG_FILE), false),
    };

    let contents = match read_config_file(&path) {
        Ok(contents) => contents,
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No {} at {}. Using default config.", PROJECT_CONFIG_FILE, root.display());
            return Ok(DepshiftConfig::default());
        }
        Err(e) => return Err(DepshiftError::config(&path, e.to_string())),
    };

    let config = parse_and_validate_config(&contents).map_err(|e| DepshiftError::config(&path, e))?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_default_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_project_config(dir.path(), None).unwrap();
        assert!(config.tracked.is_empty());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("custom.toml");
        let err = load_project_config(dir.path(), Some(&missing)).unwrap_err();
        assert!(matches!(err, DepshiftError::Config { .. }));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let contents = r#"
            [[tracked]]
            name = "lib"
            coordinate = "org.lib:lib-bom"
            lower = 14
            upper = 12
        "#;
        let err = parse_and_validate_config(contents).unwrap_err();
        assert!(err.contains("lower bound"));
    }

    #[test]
    fn test_duplicate_tracked_name_rejected() {
        let contents = r#"
            [[tracked]]
            name = "lib"
            coordinate = "org.lib:a"
            lower = 1
            upper = 2

            [[tracked]]
            name = "lib"
            coordinate = "org.lib:b"
            lower = 1
            upper = 2
        "#;
        assert!(parse_and_validate_config(contents).unwrap_err().contains("twice"));
    }

    #[test]
    fn test_loads_root_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[defaults]\nremove_obsolete = true\n",
        )
        .unwrap();
        let config = load_project_config(dir.path(), None).unwrap();
        assert_eq!(config.defaults.remove_obsolete, Some(true));
    }
}
