//! Lightweight Java reader: package name and top-level declarations.
//!
//! Comments, string/char literals and text blocks are blanked out first, then
//! declarations are read from headers that open a body at brace depth 0.
//! Braces inside annotation arguments (`@Foo({"a"})`) are not bodies.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static PACKAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*package\s+([A-Za-z_][\w.]*)\s*;").unwrap());

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(@interface|\bclass|\binterface|\benum|\brecord)\s+([A-Za-z_$][\w$]*)").unwrap()
});

static ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    /// Annotation names as written (`Foo` or `a.b.Foo`).
    pub annotations: Vec<String>,
    /// Extended and implemented types, generics stripped.
    pub supertypes: Vec<String>,
}

impl Declaration {
    /// True when the declaration carries `annotation`, compared by simple name.
    pub fn has_annotation(&self, annotation: &str) -> bool {
        let wanted = simple_name(annotation);
        self.annotations.iter().any(|a| simple_name(a) == wanted)
    }

    pub fn has_supertype(&self, supertype: &str) -> bool {
        let wanted = simple_name(supertype);
        self.supertypes.iter().any(|s| simple_name(s) == wanted)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaSource {
    pub package: Option<String>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JavaParseError {
    #[error("unterminated block comment starting on line {0}")]
    UnterminatedComment(usize),
    #[error("unterminated literal starting on line {0}")]
    UnterminatedLiteral(usize),
    #[error("unbalanced braces (depth {0} at end of file)")]
    UnbalancedBraces(i64),
    #[error("unexpected closing brace on line {0}")]
    UnexpectedClose(usize),
}

impl JavaSource {
    pub fn parse(text: &str) -> Result<Self, JavaParseError> {
        let code = blank_non_code(text)?;
        let package = PACKAGE.captures(&code).map(|c| c[1].to_string());
        let declarations = top_level_headers(&code)?
            .iter()
            .filter_map(|header| parse_header(header))
            .collect();
        Ok(Self {
            package,
            declarations,
        })
    }
}

/// Package declared by `text`, tolerating files that do not fully parse.
pub fn package_of(text: &str) -> Option<String> {
    let code = blank_non_code(text).unwrap_or_else(|_| text.to_string());
    PACKAGE.captures(&code).map(|c| c[1].to_string())
}

pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Replace comments and literals with spaces, keeping newlines.
fn blank_non_code(text: &str) -> Result<String, JavaParseError> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut line = 1;
    let mut i = 0;

    let blank = |c: char| if c == '\n' { '\n' } else { ' ' };

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match (c, next) {
            ('/', Some('/')) => {
                while i < chars.len() && chars[i] != '\n' {
                    out.push(' ');
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                let start_line = line;
                out.push_str("  ");
                i += 2;
                loop {
                    match (chars.get(i), chars.get(i + 1)) {
                        (Some('*'), Some('/')) => {
                            out.push_str("  ");
                            i += 2;
                            break;
                        }
                        (Some(&ch), _) => {
                            if ch == '\n' {
                                line += 1;
                            }
                            out.push(blank(ch));
                            i += 1;
                        }
                        (None, _) => return Err(JavaParseError::UnterminatedComment(start_line)),
                    }
                }
            }
            ('"', _) if chars.get(i + 1) == Some(&'"') && chars.get(i + 2) == Some(&'"') => {
                let start_line = line;
                out.push_str("\"\"\"");
                i += 3;
                loop {
                    match chars.get(i) {
                        Some('\\') => {
                            out.push_str("  ");
                            i += 2;
                        }
                        Some('"') if chars.get(i + 1) == Some(&'"') && chars.get(i + 2) == Some(&'"') => {
                            out.push_str("\"\"\"");
                            i += 3;
                            break;
                        }
                        Some(&ch) => {
                            if ch == '\n' {
                                line += 1;
                            }
                            out.push(blank(ch));
                            i += 1;
                        }
                        None => return Err(JavaParseError::UnterminatedLiteral(start_line)),
                    }
                }
            }
            ('"', _) | ('\'', _) => {
                let quote = c;
                out.push(quote);
                i += 1;
                loop {
                    match chars.get(i) {
                        Some('\\') => {
                            out.push_str("  ");
                            i += 2;
                        }
                        Some(&ch) if ch == quote => {
                            out.push(quote);
                            i += 1;
                            break;
                        }
                        Some('\n') | None => return Err(JavaParseError::UnterminatedLiteral(line)),
                        Some(_) => {
                            out.push(' ');
                            i += 1;
                        }
                    }
                }
            }
            _ => {
                if c == '\n' {
                    line += 1;
                }
                out.push(c);
                i += 1;
            }
        }
    }
    Ok(out)
}

/// Text preceding each `{` that opens a body at depth 0.
fn top_level_headers(code: &str) -> Result<Vec<String>, JavaParseError> {
    let mut headers = Vec::new();
    let mut header = String::new();
    let mut depth: i64 = 0;
    let mut parens: i64 = 0;
    let mut line = 1;

    for c in code.chars() {
        if c == '\n' {
            line += 1;
        }
        match c {
            '(' if depth == 0 => {
                parens += 1;
                header.push(c);
            }
            ')' if depth == 0 => {
                parens -= 1;
                header.push(c);
            }
            '{' if depth == 0 && parens > 0 => header.push(c),
            '}' if depth == 0 && parens > 0 => header.push(c),
            '{' => {
                if depth == 0 {
                    headers.push(std::mem::take(&mut header));
                }
                depth += 1;
            }
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(JavaParseError::UnexpectedClose(line));
                }
            }
            ';' if depth == 0 => header.clear(),
            _ if depth == 0 => header.push(c),
            _ => {}
        }
    }

    if depth != 0 {
        return Err(JavaParseError::UnbalancedBraces(depth));
    }
    Ok(headers)
}

fn parse_header(header: &str) -> Option<Declaration> {
    let caps = DECLARATION.captures(header)?;
    let keyword = caps.get(1)?;
    let kind = match keyword.as_str() {
        "@interface" => DeclarationKind::Annotation,
        "class" => DeclarationKind::Class,
        "interface" => DeclarationKind::Interface,
        "enum" => DeclarationKind::Enum,
        _ => DeclarationKind::Record,
    };
    let name = caps[2].to_string();

    let annotations = ANNOTATION
        .captures_iter(&header[..keyword.start()])
        .map(|c| c[1].to_string())
        .collect();

    let tail = strip_generics(&header[caps.get(0)?.end()..]);
    let supertypes = parse_supertypes(&tail);

    Some(Declaration {
        kind,
        name,
        annotations,
        supertypes,
    })
}

fn parse_supertypes(tail: &str) -> Vec<String> {
    let mut collecting = false;
    let mut out = Vec::new();
    for token in tail
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        match token {
            "extends" | "implements" => collecting = true,
            "permits" => collecting = false,
            t if collecting => out.push(t.to_string()),
            _ => {}
        }
    }
    out
}

fn strip_generics(text: &str) -> String {
    let mut depth = 0usize;
    text.chars()
        .filter(|&c| match c {
            '<' => {
                depth += 1;
                false
            }
            '>' => {
                depth = depth.saturating_sub(1);
                false
            }
            _ => depth == 0,
        })
        .collect()
}
