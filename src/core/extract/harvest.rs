//! Documentation comment harvesting.
//!
//! Each parsed file carries a [`DocIndex`] built once while parsing. Looking up
//! the documentation of a node is then a range query on that index plus a check
//! that only whitespace separates the comment from the node.

use std::collections::BTreeMap;
use tree_sitter::Node;

use super::super::ParsedFile;

#[derive(Debug, Clone, Default)]
pub struct DocIndex {
    /// Block comments keyed by end offset. `None` marks a plain `/* */` comment,
    /// which blocks the search just like code does.
    by_end: BTreeMap<usize, Option<String>>,
}

impl DocIndex {
    pub fn insert(&mut self, end: usize, raw: &str) {
        let doc = raw.starts_with("/**").then(|| normalize(raw));
        self.by_end.insert(end, doc);
    }

    /// Documentation attached to whatever starts at `offset` in `source`
    pub fn lookup(&self, source: &str, offset: usize) -> String {
        let Some((&end, doc)) = self.by_end.range(..=offset).next_back() else {
            return String::new();
        };

        let gap = source.get(end..offset).unwrap_or_default();
        match doc {
            Some(doc) if gap.trim().is_empty() => doc.clone(),
            _ => String::new(),
        }
    }
}

/// Nearest preceding documentation comment of `node`, normalised.
/// Empty when the closest non-whitespace text before the node is anything else.
pub fn harvest(file: &ParsedFile, node: Node) -> String {
    file.docs.lookup(&file.source, node.start_byte())
}

/// Strip comment markers line by line and drop empty lines
pub fn normalize(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix("/**")
                .or_else(|| line.strip_prefix('*'))
                .unwrap_or(line);
            let line = line.strip_suffix("*/").unwrap_or(line);
            line.trim()
        })
        .filter(|line| !line.is_empty() && *line != "/")
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
