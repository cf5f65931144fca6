// Test utility module for depshift integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway multi-module project on disk.
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    pub fn java(&self, module: &str, package: &str, class: &str) -> &Self {
        let rel = format!(
            "{}/src/main/java/{}/{}.java",
            module,
            package.replace('.', "/"),
            class
        );
        self.write(
            rel.trim_start_matches('/'),
            &format!("package {};\n\npublic class {} {{\n}}\n", package, class),
        )
    }
}

/// A minimal POM with optional `<modules>` and managed entries.
pub fn pom(artifact: &str, modules: &[&str], managed: &[(&str, &str, &str)]) -> String {
    let mut out = String::from("<project>\n");
    out.push_str("  <groupId>com.acme</groupId>\n");
    out.push_str(&format!("  <artifactId>{}</artifactId>\n", artifact));
    if !modules.is_empty() {
        out.push_str("  <packaging>pom</packaging>\n  <modules>\n");
        for module in modules {
            out.push_str(&format!("    <module>{}</module>\n", module));
        }
        out.push_str("  </modules>\n");
    }
    if !managed.is_empty() {
        out.push_str("  <dependencyManagement>\n    <dependencies>\n");
        for (group, artifact, version) in managed {
            out.push_str(&format!(
                "      <dependency>\n        <groupId>{}</groupId>\n        <artifactId>{}</artifactId>\n        <version>{}</version>\n      </dependency>\n",
                group, artifact, version
            ));
        }
        out.push_str("    </dependencies>\n  </dependencyManagement>\n");
    }
    out.push_str("</project>\n");
    out
}

pub const TRACKED_CONFIG: &str = r#"
[[tracked]]
name = "lib"
coordinate = "org.lib:lib-bom"
lower = 12
upper = 14

[[ordering]]
first = "org.lib:lib-bom"
second = "org.other:other-bom"
gate = "lib"
"#;
