//! Byte-range splicing that leaves untouched text byte-for-byte intact.

use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl TextEdit {
    pub fn replace(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::replace(range, String::new())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("edits overlap at bytes {first:?} and {second:?}")]
    Overlap {
        first: Range<usize>,
        second: Range<usize>,
    },
    #[error("edit range {0:?} is outside the document")]
    OutOfBounds(Range<usize>),
}

/// Apply all edits in one pass. Edits must not overlap; two insertions at
/// the same offset keep their given order.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut ordered: Vec<(usize, &TextEdit)> = edits.iter().enumerate().collect();
    ordered.sort_by_key(|(index, edit)| (edit.range.start, edit.range.end, *index));

    for (_, edit) in &ordered {
        if edit.range.start > edit.range.end
            || edit.range.end > text.len()
            || !text.is_char_boundary(edit.range.start)
            || !text.is_char_boundary(edit.range.end)
        {
            return Err(EditError::OutOfBounds(edit.range.clone()));
        }
    }
    for pair in ordered.windows(2) {
        let (a, b) = (&pair[0].1.range, &pair[1].1.range);
        if b.start < a.end {
            return Err(EditError::Overlap {
                first: a.clone(),
                second: b.clone(),
            });
        }
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (_, edit) in ordered {
        out.push_str(&text[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

/// Whitespace between the start of the line and `pos`, or empty when other
/// text precedes `pos` on that line.
pub fn indentation_at(text: &str, pos: usize) -> &str {
    let line_start = line_start(text, pos);
    let prefix = &text[line_start..pos];
    if prefix.chars().all(|c| c == ' ' || c == '\t') {
        prefix
    } else {
        ""
    }
}

fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Extend `range` to the full lines it occupies when it sits alone on them,
/// so deleting it leaves no blank line behind.
pub fn whole_line_span(text: &str, range: Range<usize>) -> Range<usize> {
    let start = line_start(text, range.start);
    let leading_blank = text[start..range.start]
        .chars()
        .all(|c| c == ' ' || c == '\t');
    let rest = &text[range.end..];
    let trailing_len = rest
        .find('\n')
        .filter(|&nl| rest[..nl].trim().is_empty())
        .map(|nl| nl + 1);

    match (leading_blank, trailing_len) {
        (true, Some(len)) => start..range.end + len,
        (true, None) if rest.trim().is_empty() => start..text.len(),
        _ => range,
    }
}

/// Insert `line` on its own line directly above the element starting at
/// `pos`, with the element's indentation.
pub fn insert_line_above(text: &str, pos: usize, line: &str) -> TextEdit {
    let indent = indentation_at(text, pos);
    if indent.len() == pos - line_start(text, pos) {
        TextEdit::insert(line_start(text, pos), format!("{}{}\n", indent, line))
    } else {
        TextEdit::insert(pos, format!("{}\n{}", line, indent))
    }
}

/// Exchange the text of two disjoint ranges.
pub fn swap(text: &str, a: Range<usize>, b: Range<usize>) -> [TextEdit; 2] {
    [
        TextEdit::replace(a.clone(), &text[b.clone()]),
        TextEdit::replace(b, &text[a]),
    ]
}

/// Re-indent a multi-line block so each line starts with `indent`.
pub fn indent_block(block: &str, indent: &str) -> String {
    block
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", indent, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_preserves_untouched_bytes() {
        let text = "a\n  <x/>\n  <y/>\nz";
        let x = text.find("<x/>").unwrap();
        let out = apply_edits(text, &[TextEdit::replace(x..x + 4, "<w/>")]).unwrap();
        assert_eq!(out, "a\n  <w/>\n  <y/>\nz");
    }

    #[test]
    fn test_overlapping_edits_rejected() {
        let err = apply_edits(
            "abcdef",
            &[TextEdit::replace(0..3, "x"), TextEdit::replace(2..4, "y")],
        )
        .unwrap_err();
        assert!(matches!(err, EditError::Overlap { .. }));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let err = apply_edits("abc", &[TextEdit::delete(1..9)]).unwrap_err();
        assert_eq!(err, EditError::OutOfBounds(1..9));
    }

    #[test]
    fn test_whole_line_span_removes_line() {
        let text = "<a>\n    <b/>\n</a>";
        let b = text.find("<b/>").unwrap();
        let span = whole_line_span(text, b..b + 4);
        let out = apply_edits(text, &[TextEdit::delete(span)]).unwrap();
        assert_eq!(out, "<a>\n</a>");
    }

    #[test]
    fn test_insert_line_above_uses_indentation() {
        let text = "<a>\n    <b/>\n</a>";
        let b = text.find("<b/>").unwrap();
        let edit = insert_line_above(text, b, "<!-- note -->");
        let out = apply_edits(text, &[edit]).unwrap();
        assert_eq!(out, "<a>\n    <!-- note -->\n    <b/>\n</a>");
    }

    #[test]
    fn test_swap_exchanges_ranges() {
        let text = "[one] [two]";
        let out = apply_edits(text, &swap(text, 0..5, 6..11)).unwrap();
        assert_eq!(out, "[two] [one]");
    }

    #[test]
    fn test_indent_block() {
        assert_eq!(indent_block("<a>\n  <b/>\n</a>", "  "), "  <a>\n    <b/>\n  </a>");
    }
}
