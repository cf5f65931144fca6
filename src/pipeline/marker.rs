//! Review markers left in descriptors when an automatic fix is unsafe.
//!
//! A marker is a single-line XML comment of the fixed shape
//! `<!-- @NeedsReview: <topic> ... <details> -->`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

pub const REVIEW_TAG: &str = "@NeedsReview:";

static XML_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*(@NeedsReview:.*?)\s*-->").unwrap());

/// Marker text for `topic`; `--` is not allowed inside XML comments.
pub fn marker_text(topic: &str, details: &str) -> String {
    let mut text = format!("{} {} ... {}", REVIEW_TAG, topic, details);
    while text.contains("--") {
        text = text.replace("--", "- -");
    }
    text
}

pub fn xml_comment(text: &str) -> String {
    format!("<!-- {} -->", text)
}

/// Marker texts already present in a document.
pub fn existing_markers(document: &str) -> BTreeSet<String> {
    XML_MARKER
        .captures_iter(document)
        .map(|caps| caps[1].to_string())
        .collect()
}
