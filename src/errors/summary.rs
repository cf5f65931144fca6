//! Grouped view of per-file failures.

use super::collection::{FileFailure, OperationType};
use std::collections::BTreeMap;
use std::path::PathBuf;

const SAMPLES_PER_KIND: usize = 3;

#[derive(Debug)]
pub struct ErrorSummary {
    pub total: usize,
    pub by_operation: BTreeMap<OperationType, usize>,
    pub by_error_kind: BTreeMap<String, Vec<PathBuf>>,
}

impl ErrorSummary {
    pub fn from_failures(failures: &[FileFailure]) -> Self {
        let mut by_operation: BTreeMap<OperationType, usize> = BTreeMap::new();
        let mut by_error_kind: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for failure in failures {
            *by_operation.entry(failure.operation).or_insert(0) += 1;
            by_error_kind
                .entry(extract_error_kind(&failure.error))
                .or_default()
                .push(failure.path.clone());
        }

        Self {
            total: failures.len(),
            by_operation,
            by_error_kind,
        }
    }

    pub fn report(&self) -> String {
        let mut report = String::new();

        report.push_str("\nFailure breakdown:\n");
        for (op_type, count) in &self.by_operation {
            report.push_str(&format!("  {}: {} file(s)\n", op_type.as_str(), count));
        }

        report.push_str("\nError categories:\n");
        for (error_kind, paths) in &self.by_error_kind {
            report.push_str(&format!("  {}: {} file(s)\n", error_kind, paths.len()));
            for path in paths.iter().take(SAMPLES_PER_KIND) {
                report.push_str(&format!("    - {}\n", path.display()));
            }
            if paths.len() > SAMPLES_PER_KIND {
                report.push_str(&format!(
                    "    ... and {} more\n",
                    paths.len() - SAMPLES_PER_KIND
                ));
            }
        }

        report
    }
}

fn extract_error_kind(error: &str) -> String {
    let lower = error.to_ascii_lowercase();
    if lower.contains("permission denied") {
        "Permission denied".to_string()
    } else if lower.contains("no such file") {
        "File not found".to_string()
    } else if lower.contains("unterminated") || lower.contains("unbalanced") {
        "Malformed source".to_string()
    } else if lower.contains("xml") || lower.contains("expected") {
        "Malformed descriptor".to_string()
    } else {
        error.lines().next().unwrap_or("Unknown error").to_string()
    }
}
