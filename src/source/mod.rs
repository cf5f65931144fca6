//! Target-language source files.

pub mod java;

pub use java::{package_of, simple_name, Declaration, DeclarationKind, JavaParseError, JavaSource};

use std::path::Path;

pub const JAVA_EXTENSION: &str = "java";

pub fn is_java_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(JAVA_EXTENSION)
}
