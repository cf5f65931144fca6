//! Read-only facts from Gradle build scripts.
//!
//! Gradle scripts are programs, so only string-notation coordinates
//! (`implementation "g:a:v"`) and `settings.gradle` includes are read.
//! They are never rewritten.

use super::coordinate::Coordinate;
use once_cell::sync::Lazy;
use regex::Regex;

static STRING_NOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*([A-Za-z][A-Za-z0-9]*)\s*\(?\s*(?:platform\s*\(\s*)?['"]([^:'"\s]+):([^:'"\s]+)(?::([^:'"\s]+))?['"]"#)
        .unwrap()
});

static INCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*include\b(.*)$").unwrap());

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap());

pub const BUILD_SCRIPTS: [&str; 2] = ["build.gradle", "build.gradle.kts"];
pub const SETTINGS_SCRIPTS: [&str; 2] = ["settings.gradle", "settings.gradle.kts"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradleDependency {
    pub coordinate: Coordinate,
    pub version: Option<String>,
    pub ordinal: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradleScript {
    pub dependencies: Vec<GradleDependency>,
}

impl GradleScript {
    pub fn parse(text: &str) -> Self {
        let dependencies = STRING_NOTATION
            .captures_iter(text)
            .enumerate()
            .map(|(ordinal, caps)| GradleDependency {
                coordinate: Coordinate::new(&caps[2], &caps[3]),
                version: caps.get(4).map(|m| m.as_str().to_string()),
                ordinal,
            })
            .collect();
        Self { dependencies }
    }
}

/// Relative directories of the projects named by `include` statements.
pub fn parse_settings_includes(text: &str) -> Vec<String> {
    INCLUDE
        .captures_iter(text)
        .flat_map(|caps| {
            QUOTED
                .captures_iter(caps.get(1).map(|m| m.as_str()).unwrap_or_default())
                .map(|q| q[1].trim_start_matches(':').replace(':', "/"))
                .collect::<Vec<_>>()
        })
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_string_notation_dependencies() {
        let script = GradleScript::parse(indoc! {r#"
            dependencies {
                implementation "org.lib:lib-core:14.2.0"
                testImplementation("org.junit:junit-bom:5.10.0")
                implementation platform("org.other:other-bom:2.0")
                api 'org.nover:nover'
            }
        "#});

        assert_eq!(script.dependencies.len(), 4);
        assert_eq!(script.dependencies[0].coordinate.artifact_id, "lib-core");
        assert_eq!(script.dependencies[0].version.as_deref(), Some("14.2.0"));
        assert_eq!(script.dependencies[2].coordinate.artifact_id, "other-bom");
        assert_eq!(script.dependencies[3].version, None);
        assert_eq!(script.dependencies[3].ordinal, 3);
    }

    #[test]
    fn test_settings_includes() {
        let includes = parse_settings_includes(indoc! {r#"
            rootProject.name = "demo"
            include ':app', ':libs:core'
            include("tools")
        "#});
        assert_eq!(includes, vec!["app", "libs/core", "tools"]);
    }
}
