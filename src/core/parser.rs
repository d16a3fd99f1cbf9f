use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tree_sitter::{Node, Tree};

use crate::config::ParsingConfig;
use crate::error::{RegeldocError, Result};
use super::extract::DocIndex;
use super::languages::{KotlinParser, LanguageParser};
use super::syntax::node_text;

/// A parsed source file: syntax tree plus the metadata needed for
/// cross-file resolution and comment harvesting
#[derive(Debug)]
pub struct ParsedFile {
    /// File path relative to the repository root
    pub path: PathBuf,

    /// Declared package, if any
    pub package: Option<String>,

    /// Import directives in source order
    pub imports: Vec<Import>,

    /// Documentation comments indexed by position
    pub docs: DocIndex,

    /// Raw source content
    pub source: String,

    /// Syntax tree of `source`
    pub tree: Tree,
}

/// A single `import` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Imported path without the trailing `.*`
    pub path: String,

    /// Name introduced by `import x.Y as Z`
    pub alias: Option<String>,

    /// `import x.y.*`
    pub wildcard: bool,
}

impl ParsedFile {
    /// Source text covered by a node of this file's tree
    pub fn text<'a>(&'a self, node: Node) -> &'a str {
        node_text(node, &self.source)
    }
}

/// Loads source files from disk and hands them to the matching language parser
pub struct SourceLoader {
    config: ParsingConfig,
    language_parsers: HashMap<String, Box<dyn LanguageParser>>,
}

impl SourceLoader {
    pub fn new(config: &ParsingConfig) -> Result<Self> {
        let mut language_parsers: HashMap<String, Box<dyn LanguageParser>> = HashMap::new();

        let kotlin_parser = KotlinParser::new()?;
        language_parsers.insert(kotlin_parser.language_name().to_string(), Box::new(kotlin_parser));

        Ok(Self {
            config: config.clone(),
            language_parsers,
        })
    }

    /// Parse every file in `files`. Files that fail to load are logged and skipped,
    /// so one broken file never hides the rest of the repository.
    pub async fn load_files(&mut self, root: &Path, files: &[PathBuf]) -> Vec<ParsedFile> {
        let mut parsed_files = Vec::with_capacity(files.len());

        for path in files {
            match self.load_file(root, path).await {
                Ok(parsed) => parsed_files.push(parsed),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        debug!("Parsed {} of {} files", parsed_files.len(), files.len());
        parsed_files
    }

    /// Read and parse a single source file
    pub async fn load_file(&mut self, root: &Path, path: &Path) -> Result<ParsedFile> {
        let language = self.detect_language(path)?;
        let source_content = tokio::fs::read_to_string(path).await?;

        if source_content.len() > self.config.max_file_size {
            return Err(RegeldocError::Parser(
                format!("File {} exceeds maximum size limit", path.display())
            ));
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        self.parse_source(&language, &source_content, relative)
    }

    /// Parse already loaded source text
    pub fn parse_source(&mut self, language: &str, content: &str, relative_path: &Path) -> Result<ParsedFile> {
        let parser = self.language_parsers.get_mut(language)
            .ok_or_else(|| RegeldocError::Parser(format!("No parser registered for {}", language)))?;

        let parsed = parser.parse(content, relative_path)?;
        if parsed.tree.root_node().has_error() {
            debug!("{} contains syntax errors; extraction continues on the valid parts", relative_path.display());
        }
        Ok(parsed)
    }

    /// Detect programming language from file path
    fn detect_language(&self, path: &Path) -> Result<String> {
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            if self.config.file_extensions.iter().any(|e| e == extension) {
                for (lang, parser) in &self.language_parsers {
                    if parser.file_extensions().contains(&extension) {
                        return Ok(lang.clone());
                    }
                }
            }
        }

        Err(RegeldocError::Parser(
            format!("Could not detect language for file: {}", path.display())
        ))
    }
}
