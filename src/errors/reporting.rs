//! Stderr reporting of per-file failures.

use super::collection::FileFailure;
use super::summary::ErrorSummary;

/// Print a grouped breakdown of failures, if any.
pub fn report_failures(failures: &[FileFailure]) {
    if failures.is_empty() {
        return;
    }
    let summary = ErrorSummary::from_failures(failures);
    eprintln!("\n{} file(s) could not be processed:", summary.total);
    eprintln!("{}", summary.report());
}

/// One-line summary of a scan.
pub fn report_brief_summary(scanned: usize, failures: &[FileFailure]) {
    if failures.is_empty() {
        eprintln!("✓ Scanned {} files", scanned);
    } else {
        eprintln!("⚠ Scanned {} files ({} failed)", scanned, failures.len());
    }
}
