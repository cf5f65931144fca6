use crate::config::PROJECT_CONFIG_FILE;
use crate::errors::DepshiftError;
use crate::io::write_atomic;
use anyhow::Result;
use std::path::Path;

pub const DEFAULT_CONFIG: &str = r#"# Depshift Configuration

# Dependencies whose declared version gates automatic edits.
# Versions at or above `upper` are compatible, below `lower` incompatible,
# and anything in between needs review.
# [[tracked]]
# name = "platform"
# coordinate = "org.example:platform-bom"
# lower = 2
# upper = 3

# Managed entries that must appear in this order.
# [[ordering]]
# first = "org.example:platform-bom"
# second = "org.other:other-bom"
# gate = "platform"

# Managed entries to remove (needs remove_obsolete = true).
# [[obsolete]]
# coordinate = "javax.xml.bind:jaxb-api"

# Managed entries to add when missing.
# [[inject]]
# coordinate = "org.example:platform-extras-bom"
# version = "3.0.0"
# type = "pom"
# scope = "import"

[generation]
default_namespace = "app"
suffix = "ScanConfiguration"

# Process-wide settings; modules refine them with .depshift.toml.
[defaults]
generate = false
remove_obsolete = false

[ignore]
patterns = [
    "target/**",
    "build/**",
    "node_modules/**",
]
"#;

pub fn init_config(root: &Path, force: bool) -> Result<()> {
    let config_path = root.join(PROJECT_CONFIG_FILE);

    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file {} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    write_atomic(&config_path, DEFAULT_CONFIG).map_err(|source| DepshiftError::Write {
        path: config_path.clone(),
        source,
    })?;
    println!("Created {} configuration file", config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_and_validate_config;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = parse_and_validate_config(DEFAULT_CONFIG).unwrap();
        assert!(config.tracked.is_empty());
        assert_eq!(config.generation.default_namespace, "app");
        assert_eq!(config.get_ignore_patterns().len(), 3);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        init_config(dir.path(), false).unwrap();
        assert!(init_config(dir.path(), false).is_err());
        init_config(dir.path(), true).unwrap();
    }

    #[test]
    fn test_write_failure_is_typed() {
        let dir = TempDir::new().unwrap();
        let err = init_config(&dir.path().join("missing"), false).unwrap_err();
        let typed = err.downcast_ref::<DepshiftError>().unwrap();
        assert!(matches!(typed, DepshiftError::Write { .. }));
        assert_eq!(typed.exit_code(), 1);
    }
}
