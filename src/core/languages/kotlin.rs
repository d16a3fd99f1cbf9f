// src/core/languages/kotlin.rs
use std::path::Path;
use tree_sitter::{Node, Parser, Query, QueryCursor};

use crate::error::{RegeldocError, Result};
use super::LanguageParser;
use super::super::extract::DocIndex;
use super::super::parser::{Import, ParsedFile};
use super::super::syntax::{child_of_kind, children_of_kind, node_text};

/// Kotlin parser using Tree-sitter
pub struct KotlinParser {
    parser: Parser,
    comment_query: Query,
}

impl KotlinParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let kotlin_language = tree_sitter_kotlin::language();
        parser.set_language(&kotlin_language)
            .map_err(|e| RegeldocError::Parser(format!("Failed to set Kotlin language: {}", e)))?;

        let comment_query = Query::new(&kotlin_language, "(multiline_comment) @comment")
            .map_err(|e| RegeldocError::Parser(format!("Invalid comment query: {}", e)))?;

        Ok(Self { parser, comment_query })
    }

    /// Build the documentation index for the whole file in one pass
    fn index_comments(&self, root: Node, source: &str) -> DocIndex {
        let mut docs = DocIndex::default();
        let mut cursor = QueryCursor::new();

        for query_match in cursor.matches(&self.comment_query, root, source.as_bytes()) {
            for capture in query_match.captures {
                let node = capture.node;
                docs.insert(node.end_byte(), node_text(node, source));
            }
        }

        docs
    }

    fn extract_package(&self, root: Node, source: &str) -> Option<String> {
        let header = child_of_kind(root, "package_header")?;
        let identifier = child_of_kind(header, "identifier")?;
        Some(compact(node_text(identifier, source)))
    }

    fn extract_imports(&self, root: Node, source: &str) -> Vec<Import> {
        let mut headers = children_of_kind(root, "import_header");
        for list in children_of_kind(root, "import_list") {
            headers.extend(children_of_kind(list, "import_header"));
        }

        headers
            .into_iter()
            .filter_map(|header| {
                let identifier = child_of_kind(header, "identifier")?;
                let alias = child_of_kind(header, "import_alias")
                    .and_then(|alias| child_of_kind(alias, "type_identifier"))
                    .map(|name| node_text(name, source).to_string());

                Some(Import {
                    path: compact(node_text(identifier, source)),
                    alias,
                    wildcard: child_of_kind(header, "wildcard_import").is_some(),
                })
            })
            .collect()
    }
}

impl LanguageParser for KotlinParser {
    fn parse(&mut self, content: &str, file_path: &Path) -> Result<ParsedFile> {
        let tree = self.parser.parse(content, None)
            .ok_or_else(|| RegeldocError::Parser(format!("Failed to parse Kotlin code in {}", file_path.display())))?;

        let root_node = tree.root_node();
        let package = self.extract_package(root_node, content);
        let imports = self.extract_imports(root_node, content);
        let docs = self.index_comments(root_node, content);

        Ok(ParsedFile {
            path: file_path.to_path_buf(),
            package,
            imports,
            docs,
            source: content.to_string(),
            tree,
        })
    }

    fn file_extensions(&self) -> &[&str] {
        &["kt"]
    }

    fn language_name(&self) -> &str {
        "kotlin"
    }
}

/// Qualified names may span lines or carry stray whitespace
fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
