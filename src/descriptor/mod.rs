//! Build descriptors: Maven POMs (primary) and Gradle scripts (secondary).

pub mod coordinate;
pub mod edit;
pub mod gradle;
pub mod pom;

pub use coordinate::Coordinate;
pub use edit::{apply_edits, EditError, TextEdit};
pub use gradle::{GradleDependency, GradleScript};
pub use pom::{DependencyEntry, DependencySection, PomDocument, Profile, PropertyEntry, Section};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const POM_FILE: &str = "pom.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    Maven,
    Gradle,
}

/// The descriptor file that defines a module directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorRef {
    pub kind: DescriptorKind,
    pub path: PathBuf,
}
