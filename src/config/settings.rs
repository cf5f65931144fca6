//! Per-module settings: a closed set of boolean flags and enumerated choices.
//!
//! Settings come from an optional `.depshift.toml` at a module root, from the
//! `[defaults]` table of the project configuration, and from `--set`
//! overrides. Unknown keys and values of the wrong type are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const MODULE_SETTINGS_FILE: &str = ".depshift.toml";

/// Opt-in capability flags. Once true at a module, true for its subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    /// Leave the module untouched.
    OptOut,
    /// Allow generating the scan configuration artifact.
    Generate,
    /// Allow removing obsolete managed entries.
    RemoveObsolete,
}

impl Flag {
    pub const ALL: [Flag; 3] = [Flag::OptOut, Flag::Generate, Flag::RemoveObsolete];

    pub fn key(&self) -> &'static str {
        match self {
            Self::OptOut => "opt_out",
            Self::Generate => "generate",
            Self::RemoveObsolete => "remove_obsolete",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// How the generated artifact's base name is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactNaming {
    /// Last segment of the placement namespace.
    #[default]
    Namespace,
    /// The module's own name.
    Module,
}

impl FromStr for ArtifactNaming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "namespace" => Ok(Self::Namespace),
            "module" => Ok(Self::Module),
            other => Err(format!("unknown artifact_naming '{}'", other)),
        }
    }
}

impl fmt::Display for ArtifactNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Namespace => "namespace",
            Self::Module => "module",
        })
    }
}

/// Indentation used in generated source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indent {
    Spaces2,
    #[default]
    Spaces4,
    Tab,
}

impl Indent {
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Spaces2 => "  ",
            Self::Spaces4 => "    ",
            Self::Tab => "\t",
        }
    }
}

impl FromStr for Indent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spaces2" => Ok(Self::Spaces2),
            "spaces4" => Ok(Self::Spaces4),
            "tab" => Ok(Self::Tab),
            other => Err(format!("unknown indent '{}'", other)),
        }
    }
}

impl fmt::Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Spaces2 => "spaces2",
            Self::Spaces4 => "spaces4",
            Self::Tab => "tab",
        })
    }
}

/// One layer of settings; `None` means "not stated here".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSettings {
    #[serde(default)]
    pub opt_out: Option<bool>,
    #[serde(default)]
    pub generate: Option<bool>,
    #[serde(default)]
    pub remove_obsolete: Option<bool>,
    #[serde(default)]
    pub artifact_naming: Option<ArtifactNaming>,
    #[serde(default)]
    pub indent: Option<Indent>,
}

impl ModuleSettings {
    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::OptOut => self.opt_out = Some(value),
            Flag::Generate => self.generate = Some(value),
            Flag::RemoveObsolete => self.remove_obsolete = Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Read recognised keys from a TOML table, ignoring everything else.
    pub fn from_table(table: &toml::Table, origin: &str) -> Self {
        let mut settings = Self::default();
        for (key, value) in table {
            if let Some(flag) = Flag::from_key(key) {
                match value.as_bool() {
                    Some(b) => settings.set_flag(flag, b),
                    None => log::warn!("{}: '{}' must be a boolean, ignoring", origin, key),
                }
                continue;
            }
            match key.as_str() {
                "artifact_naming" => {
                    settings.artifact_naming = parse_choice(value, key, origin);
                }
                "indent" => {
                    settings.indent = parse_choice(value, key, origin);
                }
                _ => log::debug!("{}: ignoring unrecognised key '{}'", origin, key),
            }
        }
        settings
    }

    /// Parse settings file contents. Malformed TOML yields empty settings.
    pub fn parse(contents: &str, origin: &str) -> Self {
        match toml::from_str::<toml::Table>(contents) {
            Ok(table) => Self::from_table(&table, origin),
            Err(e) => {
                log::warn!("{}: failed to parse settings ({}), ignoring file", origin, e);
                Self::default()
            }
        }
    }

    /// Load `.depshift.toml` from a module directory when present.
    pub fn load(module_dir: &Path) -> Option<Self> {
        let path = module_dir.join(MODULE_SETTINGS_FILE);
        let contents = super::loader::read_config_file(&path)
            .map_err(|e| super::loader::handle_read_error(&path, &e))
            .ok()?;
        Some(Self::parse(&contents, &path.display().to_string()))
    }

    /// Apply a `key=value` override, as given on the command line.
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), String> {
        let (key, value) = assignment
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .ok_or_else(|| format!("expected key=value, found '{}'", assignment))?;

        if let Some(flag) = Flag::from_key(key) {
            let b = value
                .parse::<bool>()
                .map_err(|_| format!("'{}' expects true or false, found '{}'", key, value))?;
            self.set_flag(flag, b);
            return Ok(());
        }
        match key {
            "artifact_naming" => self.artifact_naming = Some(value.parse()?),
            "indent" => self.indent = Some(value.parse()?),
            other => return Err(format!("unknown setting '{}'", other)),
        }
        Ok(())
    }
}

fn parse_choice<T: FromStr<Err = String>>(value: &toml::Value, key: &str, origin: &str) -> Option<T> {
    match value.as_str().map(str::parse::<T>) {
        Some(Ok(choice)) => Some(choice),
        Some(Err(e)) => {
            log::warn!("{}: {}, ignoring", origin, e);
            None
        }
        None => {
            log::warn!("{}: '{}' must be a string, ignoring", origin, key);
            None
        }
    }
}

/// Fully resolved settings of one module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub opt_out: bool,
    pub generate: bool,
    pub remove_obsolete: bool,
    pub artifact_naming: ArtifactNaming,
    pub indent: Indent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_keys_and_bad_types_are_ignored() {
        let settings = ModuleSettings::parse(
            "generate = true\nopt_out = \"yes\"\ncolour = \"blue\"\nindent = \"tab\"\nartifact_naming = \"bogus\"\n",
            "test",
        );
        assert_eq!(settings.generate, Some(true));
        assert_eq!(settings.opt_out, None);
        assert_eq!(settings.indent, Some(Indent::Tab));
        assert_eq!(settings.artifact_naming, None);
    }

    #[test]
    fn test_malformed_file_is_empty() {
        assert!(ModuleSettings::parse("generate = [", "test").is_empty());
    }

    #[test]
    fn test_apply_override() {
        let mut settings = ModuleSettings::default();
        settings.apply_override("remove_obsolete=true").unwrap();
        settings.apply_override("artifact_naming = module").unwrap();
        assert_eq!(settings.remove_obsolete, Some(true));
        assert_eq!(settings.artifact_naming, Some(ArtifactNaming::Module));

        assert!(settings.apply_override("generate=maybe").is_err());
        assert!(settings.apply_override("nope=1").is_err());
        assert!(settings.apply_override("generate").is_err());
    }

    #[test]
    fn test_load_from_module_dir() {
        let dir = TempDir::new().unwrap();
        assert_eq!(ModuleSettings::load(dir.path()), None);

        std::fs::write(dir.path().join(MODULE_SETTINGS_FILE), "opt_out = true\n").unwrap();
        let loaded = ModuleSettings::load(dir.path()).unwrap();
        assert_eq!(loaded.opt_out, Some(true));
    }
}
