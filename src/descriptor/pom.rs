//! Maven `pom.xml` model with document-order sections and byte ranges.
//!
//! Reading is done with `roxmltree`; every element of interest keeps the byte
//! range it occupies in the original text so that edits can splice the file
//! without reformatting untouched siblings. Elements are matched by local
//! name, so documents using the POM namespace (or none) read the same.

use super::coordinate::Coordinate;
use roxmltree::{Document, Node};
use std::ops::Range;

/// Where a dependency entry lives inside a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Dependencies,
    DependencyManagement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    pub coordinate: Coordinate,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub kind: Option<String>,
    /// 0-based position within its section, in document order.
    pub ordinal: usize,
    pub range: Range<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySection {
    /// Range of the `<dependencies>` element, when the section exists.
    pub range: Option<Range<usize>>,
    pub entries: Vec<DependencyEntry>,
}

impl DependencySection {
    pub fn find(&self, coordinate: &Coordinate) -> Option<&DependencyEntry> {
        self.entries.iter().find(|e| &e.coordinate == coordinate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEntry {
    pub name: String,
    pub value: String,
    pub range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub coordinate: Coordinate,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub range: Range<usize>,
    pub dependencies: DependencySection,
    pub managed: DependencySection,
    pub properties: Vec<PropertyEntry>,
}

/// Structured view of one `pom.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomDocument {
    pub coordinate: Option<Coordinate>,
    pub version: Option<String>,
    pub parent: Option<ParentRef>,
    pub modules: Vec<String>,
    pub properties: Vec<PropertyEntry>,
    pub dependencies: DependencySection,
    pub managed: DependencySection,
    /// Range of `<dependencyManagement>` itself.
    pub management_range: Option<Range<usize>>,
    pub profiles: Vec<Profile>,
    pub source_directory: Option<String>,
    pub test_source_directory: Option<String>,
    /// Byte offset of the `</project>` closing tag.
    pub project_close: usize,
}

impl PomDocument {
    pub fn parse(text: &str) -> Result<Self, roxmltree::Error> {
        let doc = Document::parse(text)?;
        let project = doc.root_element();
        let project_range = project.range();
        let project_close = text[project_range.clone()]
            .rfind("</")
            .map(|offset| project_range.start + offset)
            .unwrap_or(project_range.end);

        let parent = child_element(project, "parent").and_then(|node| {
            Some(ParentRef {
                coordinate: Coordinate::new(
                    child_text(node, "groupId")?,
                    child_text(node, "artifactId")?,
                ),
                version: child_text(node, "version"),
            })
        });

        let group_id = child_text(project, "groupId")
            .or_else(|| parent.as_ref().map(|p| p.coordinate.group_id.clone()));
        let coordinate = match (group_id, child_text(project, "artifactId")) {
            (Some(group), Some(artifact)) => Some(Coordinate::new(group, artifact)),
            _ => None,
        };

        let modules = child_element(project, "modules")
            .map(|node| {
                node.children()
                    .filter(|n| n.is_element() && n.tag_name().name() == "module")
                    .filter_map(|n| n.text())
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let properties = parse_properties(child_element(project, "properties"));

        let management = child_element(project, "dependencyManagement");
        let build = child_element(project, "build");

        let profiles = child_element(project, "profiles")
            .map(|node| {
                node.children()
                    .filter(|n| n.is_element() && n.tag_name().name() == "profile")
                    .enumerate()
                    .map(|(index, profile)| parse_profile(profile, index))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            coordinate,
            version: child_text(project, "version"),
            parent,
            modules,
            properties,
            dependencies: parse_section(child_element(project, "dependencies")),
            managed: parse_section(management.and_then(|m| child_element(m, "dependencies"))),
            management_range: management.map(|m| m.range()),
            profiles,
            source_directory: build.and_then(|b| child_text(b, "sourceDirectory")),
            test_source_directory: build.and_then(|b| child_text(b, "testSourceDirectory")),
            project_close,
        })
    }

    pub fn section(&self, profile: Option<&str>, section: Section) -> Option<&DependencySection> {
        match profile {
            None => Some(match section {
                Section::Dependencies => &self.dependencies,
                Section::DependencyManagement => &self.managed,
            }),
            Some(id) => self.profile(id).map(|p| match section {
                Section::Dependencies => &p.dependencies,
                Section::DependencyManagement => &p.managed,
            }),
        }
    }

    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyEntry> {
        self.properties.iter().find(|p| p.name == name)
    }
}

fn parse_profile(node: Node<'_, '_>, index: usize) -> Profile {
    let id = child_text(node, "id").unwrap_or_else(|| format!("profile-{}", index));
    let management = child_element(node, "dependencyManagement");
    Profile {
        id,
        range: node.range(),
        dependencies: parse_section(child_element(node, "dependencies")),
        managed: parse_section(management.and_then(|m| child_element(m, "dependencies"))),
        properties: parse_properties(child_element(node, "properties")),
    }
}

fn parse_properties(node: Option<Node<'_, '_>>) -> Vec<PropertyEntry> {
    node.map(|node| {
        node.children()
            .filter(|n| n.is_element())
            .map(|n| PropertyEntry {
                name: n.tag_name().name().to_string(),
                value: n.text().map(str::trim).unwrap_or_default().to_string(),
                range: n.range(),
            })
            .collect()
    })
    .unwrap_or_default()
}

fn parse_section(node: Option<Node<'_, '_>>) -> DependencySection {
    let Some(node) = node else {
        return DependencySection::default();
    };

    let entries = node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "dependency")
        .filter_map(|dep| {
            let group_id = child_text(dep, "groupId")?;
            let artifact_id = child_text(dep, "artifactId")?;
            Some((dep, Coordinate::new(group_id, artifact_id)))
        })
        .enumerate()
        .map(|(ordinal, (dep, coordinate))| DependencyEntry {
            coordinate,
            version: child_text(dep, "version"),
            scope: child_text(dep, "scope"),
            kind: child_text(dep, "type"),
            ordinal,
            range: dep.range(),
        })
        .collect();

    DependencySection {
        range: Some(node.range()),
        entries,
    }
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child_element(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
