//! Language-specific parsers
//!
//! Each language gets its own module with a consistent interface for parsing
//! source code into a syntax tree plus the per-file metadata the symbol table
//! needs (package, imports, documentation comments).

mod kotlin;

pub use kotlin::KotlinParser;

use crate::error::Result;
use super::ParsedFile;

/// Trait that all language parsers must implement
pub trait LanguageParser: Send {
    /// Parse source code into a syntax tree with file-level metadata.
    /// `file_path` is stored as-is on the result.
    fn parse(&mut self, content: &str, file_path: &std::path::Path) -> Result<ParsedFile>;

    /// Get the file extensions this parser handles
    fn file_extensions(&self) -> &[&str];

    /// Get the language name
    fn language_name(&self) -> &str;
}
