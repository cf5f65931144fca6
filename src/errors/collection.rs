//! Per-file failure collection.
//!
//! Files are processed independently. A failure on one file is recorded and
//! the run continues with the rest, so callers get both what succeeded and
//! everything that went wrong.

use anyhow::Error;
use serde::Serialize;
use std::path::PathBuf;

/// Successes and failures from a batch of independent file operations.
#[derive(Debug, Clone)]
pub struct FileResults<T> {
    pub successes: Vec<T>,
    pub failures: Vec<FileFailure>,
}

impl<T> Default for FileResults<T> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> FileResults<T> {
    pub fn new(successes: Vec<T>, failures: Vec<FileFailure>) -> Self {
        Self {
            successes,
            failures,
        }
    }

    /// Split a batch of results into successes and failures.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = Result<T, FileFailure>>,
    {
        let mut collected = Self::default();
        for result in results {
            match result {
                Ok(value) => collected.successes.push(value),
                Err(failure) => collected.failures.push(failure),
            }
        }
        collected
    }

    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn total_count(&self) -> usize {
        self.success_count() + self.failure_count()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A file that could not be read, parsed, or rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub operation: OperationType,
    pub error: String,
}

impl FileFailure {
    pub fn new(path: PathBuf, operation: OperationType, error: Error) -> Self {
        Self {
            path,
            operation,
            error: format!("{:#}", error),
        }
    }

    pub fn file_read(path: PathBuf, error: Error) -> Self {
        Self::new(path, OperationType::FileRead, error)
    }

    pub fn descriptor_parse(path: PathBuf, error: Error) -> Self {
        Self::new(path, OperationType::DescriptorParse, error)
    }

    pub fn source_parse(path: PathBuf, error: Error) -> Self {
        Self::new(path, OperationType::SourceParse, error)
    }

    pub fn file_write(path: PathBuf, error: Error) -> Self {
        Self::new(path, OperationType::FileWrite, error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    FileRead,
    DescriptorParse,
    SourceParse,
    FileWrite,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileRead => "File read",
            Self::DescriptorParse => "Descriptor parse",
            Self::SourceParse => "Source parse",
            Self::FileWrite => "File write",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_from_results_splits_batch() {
        let results = FileResults::from_results(vec![
            Ok(1),
            Err(FileFailure::source_parse(
                PathBuf::from("A.java"),
                anyhow!("unterminated comment at line 3"),
            )),
            Ok(2),
        ]);

        assert_eq!(results.success_count(), 2);
        assert_eq!(results.failure_count(), 1);
        assert_eq!(results.total_count(), 3);
        assert!(!results.is_complete_success());
        assert_eq!(results.failures[0].operation, OperationType::SourceParse);
    }

    #[test]
    fn test_failure_keeps_context_chain() {
        let failure = FileFailure::file_read(
            PathBuf::from("pom.xml"),
            anyhow!("Permission denied").context("reading descriptor"),
        );
        assert_eq!(failure.error, "reading descriptor: Permission denied");
    }

    #[test]
    fn test_operation_type_as_str() {
        assert_eq!(OperationType::DescriptorParse.as_str(), "Descriptor parse");
        assert_eq!(OperationType::FileWrite.as_str(), "File write");
    }
}
