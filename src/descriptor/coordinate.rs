use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `groupId:artifactId` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
}

impl Coordinate {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

impl FromStr for Coordinate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(artifact), None) if !group.is_empty() && !artifact.is_empty() => {
                Ok(Self::new(group, artifact))
            }
            _ => Err(format!("expected 'groupId:artifactId', found '{}'", s)),
        }
    }
}

impl TryFrom<String> for Coordinate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coordinate> for String {
    fn from(c: Coordinate) -> Self {
        c.to_string()
    }
}
