// src/core/workspace.rs
//! Read-only snapshot of every parsed file plus a symbol table.
//!
//! The workspace is built once and never mutated, so extraction can borrow it
//! from any number of worker threads.

use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use tracing::debug;
use tree_sitter::Node;

use super::parser::ParsedFile;
use super::syntax::{
    child_of_kind, children_of_kind, is_dotted_path, node_text, type_segments, unwrap_type,
};

/// What kind of declaration a symbol denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// `class`, `data class`, `enum class`, `interface`
    Class,
    /// `object`
    Object,
    /// Top-level `fun`
    Function,
}

impl DeclarationKind {
    fn node_kind(self) -> &'static str {
        match self {
            DeclarationKind::Class => "class_declaration",
            DeclarationKind::Object => "object_declaration",
            DeclarationKind::Function => "function_declaration",
        }
    }
}

/// Handle to a declaration inside the workspace
#[derive(Debug, Clone, Copy)]
pub struct Declaration<'a> {
    pub file: &'a ParsedFile,
    pub node: Node<'a>,
    pub kind: DeclarationKind,
}

impl<'a> Declaration<'a> {
    /// Simple name as written in the declaration
    pub fn name(&self) -> &'a str {
        let identifier = match self.kind {
            DeclarationKind::Function => child_of_kind(self.node, "simple_identifier"),
            _ => child_of_kind(self.node, "type_identifier"),
        };
        identifier.map(|id| self.file.text(id)).unwrap_or_default()
    }

    /// Originating file, relative to the repository root
    pub fn path(&self) -> &'a Path {
        &self.file.path
    }

    pub fn text(&self, node: Node) -> &'a str {
        self.file.text(node)
    }

    /// `abstract` classes and interfaces are never documented themselves
    pub fn is_concrete(&self) -> bool {
        if self.kind != DeclarationKind::Class {
            return self.kind == DeclarationKind::Object;
        }

        let mut cursor = self.node.walk();
        let is_interface = self.node.children(&mut cursor).any(|child| child.kind() == "interface");
        let is_abstract = child_of_kind(self.node, "modifiers")
            .map(|modifiers| {
                children_of_kind(modifiers, "inheritance_modifier")
                    .into_iter()
                    .any(|modifier| self.file.text(modifier) == "abstract")
            })
            .unwrap_or(false);

        !is_interface && !is_abstract
    }
}

#[derive(Debug, Clone)]
struct Symbol {
    file: usize,
    kind: DeclarationKind,
    range: Range<usize>,
}

/// All parsed files and the symbol table used for cross-file resolution
#[derive(Debug)]
pub struct Workspace {
    files: Vec<ParsedFile>,
    symbols: Vec<Symbol>,
    by_qualified_name: HashMap<String, Vec<usize>>,
    by_simple_name: HashMap<String, Vec<usize>>,
}

impl Workspace {
    pub fn new(files: Vec<ParsedFile>) -> Self {
        let mut workspace = Self {
            files,
            symbols: Vec::new(),
            by_qualified_name: HashMap::new(),
            by_simple_name: HashMap::new(),
        };

        for index in 0..workspace.files.len() {
            workspace.index_file(index);
        }

        debug!(
            "Indexed {} symbols across {} files",
            workspace.symbols.len(),
            workspace.files.len()
        );
        workspace
    }

    pub fn files(&self) -> &[ParsedFile] {
        &self.files
    }

    /// Every class and object declaration, in file order, nested ones included
    pub fn declarations(&self) -> Vec<Declaration<'_>> {
        self.symbols
            .iter()
            .filter(|symbol| symbol.kind != DeclarationKind::Function)
            .filter_map(|symbol| self.declaration(symbol))
            .collect()
    }

    /// Resolve a reference expression (`simple_identifier`, dotted
    /// `navigation_expression` or type) as seen from `file`. A dotted
    /// expression only resolves by its fully qualified name.
    pub fn resolve_reference<'a>(&'a self, file: &ParsedFile, node: Node) -> Option<Declaration<'a>> {
        match node.kind() {
            "simple_identifier" => self.resolve_name(file, node_text(node, &file.source)),
            "navigation_expression" if is_dotted_path(node) => {
                let qualified: String = node_text(node, &file.source)
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                self.lookup_qualified(&qualified)
            }
            "navigation_expression" => None,
            _ => self.resolve_type(file, node),
        }
    }

    /// Resolve a type node (`user_type`, optionally nullable) as seen from `file`
    pub fn resolve_type<'a>(&'a self, file: &ParsedFile, node: Node) -> Option<Declaration<'a>> {
        let user_type = unwrap_type(node)?;
        let segments = type_segments(user_type, &file.source);
        self.resolve_qualified(file, &segments)
    }

    fn resolve_qualified<'a>(&'a self, file: &ParsedFile, segments: &[&str]) -> Option<Declaration<'a>> {
        match segments {
            [] => None,
            [name] => self.resolve_name(file, name),
            [.., last] => self
                .lookup_qualified(&segments.join("."))
                .or_else(|| self.lookup_unique(last)),
        }
    }

    /// Resolve a simple name: explicit imports, then the file's own package,
    /// then wildcard imports, then a globally unique declaration
    pub fn resolve_name<'a>(&'a self, file: &ParsedFile, name: &str) -> Option<Declaration<'a>> {
        for import in file.imports.iter().filter(|import| !import.wildcard) {
            let visible = import
                .alias
                .as_deref()
                .unwrap_or_else(|| import.path.rsplit('.').next().unwrap_or_default());
            if visible == name {
                return self.lookup_qualified(&import.path);
            }
        }

        if let Some(found) = self.lookup_qualified(&qualify(file.package.as_deref(), name)) {
            return Some(found);
        }

        for import in file.imports.iter().filter(|import| import.wildcard) {
            if let Some(found) = self.lookup_qualified(&format!("{}.{}", import.path, name)) {
                return Some(found);
            }
        }

        self.lookup_unique(name)
    }

    fn lookup_qualified(&self, qualified_name: &str) -> Option<Declaration<'_>> {
        let candidates = self.by_qualified_name.get(qualified_name)?;
        candidates.first().and_then(|&index| self.declaration(&self.symbols[index]))
    }

    fn lookup_unique(&self, name: &str) -> Option<Declaration<'_>> {
        match self.by_simple_name.get(name).map(Vec::as_slice) {
            Some([index]) => self.declaration(&self.symbols[*index]),
            _ => None,
        }
    }

    /// Re-locate a symbol's node in its file's tree
    fn declaration(&self, symbol: &Symbol) -> Option<Declaration<'_>> {
        let file = self.files.get(symbol.file)?;
        let mut node = file
            .tree
            .root_node()
            .descendant_for_byte_range(symbol.range.start, symbol.range.end)?;

        while node.kind() != symbol.kind.node_kind() || node.byte_range() != symbol.range {
            node = node.parent()?;
        }

        Some(Declaration { file, node, kind: symbol.kind })
    }

    fn index_file(&mut self, file_index: usize) {
        let mut found = Vec::new();
        {
            let file = &self.files[file_index];
            let prefix = file.package.clone();
            collect_declarations(file, file.tree.root_node(), prefix.as_deref(), true, &mut found);
        }

        for (qualified_name, simple_name, kind, range) in found {
            let index = self.symbols.len();
            self.symbols.push(Symbol { file: file_index, kind, range });
            self.by_qualified_name.entry(qualified_name).or_default().push(index);
            self.by_simple_name.entry(simple_name).or_default().push(index);
        }
    }
}

type FoundDeclaration = (String, String, DeclarationKind, Range<usize>);

fn collect_declarations(
    file: &ParsedFile,
    container: Node,
    prefix: Option<&str>,
    top_level: bool,
    found: &mut Vec<FoundDeclaration>,
) {
    let mut cursor = container.walk();
    for child in container.named_children(&mut cursor) {
        let (kind, name_kind) = match child.kind() {
            "class_declaration" => (DeclarationKind::Class, "type_identifier"),
            "object_declaration" => (DeclarationKind::Object, "type_identifier"),
            "function_declaration" if top_level => (DeclarationKind::Function, "simple_identifier"),
            _ => continue,
        };

        let Some(name_node) = child_of_kind(child, name_kind) else {
            continue;
        };
        let name = file.text(name_node).to_string();
        let qualified_name = qualify(prefix, &name);

        if kind != DeclarationKind::Function {
            if let Some(body) = child_of_kind(child, "class_body") {
                collect_declarations(file, body, Some(&qualified_name), false, found);
            }
        }

        found.push((qualified_name, name, kind, child.byte_range()));
    }
}

fn qualify(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, name),
        _ => name.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::languages::{KotlinParser, LanguageParser};

    /// Parse in-memory sources; paths are taken as repository-relative
    pub(crate) fn workspace(sources: &[(&str, &str)]) -> Workspace {
        let mut parser = KotlinParser::new().unwrap();
        let files = sources
            .iter()
            .map(|(path, source)| parser.parse(source, Path::new(path)).unwrap())
            .collect();
        Workspace::new(files)
    }

    /// The identifier at the start of the first occurrence of `needle`
    fn identifier<'a>(ws: &'a Workspace, file: usize, needle: &str) -> Node<'a> {
        let file = &ws.files()[file];
        let offset = file.source.find(needle).unwrap();
        let name_len = needle.find('(').unwrap_or(needle.len());
        file.tree
            .root_node()
            .descendant_for_byte_range(offset, offset + name_len)
            .unwrap()
    }

    #[test]
    fn test_declarations_include_nested_classes() {
        let ws = workspace(&[(
            "a/A.kt",
            "package a\nclass Outer {\n    class Inner\n}\nobject Single\nfun helper() = 1\n",
        )]);

        let names: Vec<_> = ws.declarations().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["Inner", "Outer", "Single"]);
    }

    #[test]
    fn test_resolve_by_import_alias_package_and_wildcard() {
        let ws = workspace(&[
            ("x/Target.kt", "package x.y\nclass Target\nclass Other\n"),
            ("z/Same.kt", "package z\nclass Same\n"),
            (
                "z/User.kt",
                "package z\nimport x.y.Target as T\nimport x.y.*\nfun f() {\n    T()\n    Same()\n    Other()\n}\n",
            ),
        ]);
        let user = &ws.files()[2];

        let aliased = ws.resolve_reference(user, identifier(&ws, 2, "T()")).map(|d| d.name());
        assert_eq!(aliased, Some("Target"));

        let same_package = ws.resolve_name(user, "Same").unwrap();
        assert_eq!(same_package.path(), Path::new("z/Same.kt"));

        let wildcard = ws.resolve_name(user, "Other").unwrap();
        assert_eq!(wildcard.path(), Path::new("x/Target.kt"));
    }

    #[test]
    fn test_dotted_reference_needs_fully_qualified_name() {
        let ws = workspace(&[
            ("x/Target.kt", "package x.y\nclass Target\n"),
            ("z/User.kt", "package z\nfun f() {\n    x.y.Target()\n    verdi.Target()\n}\n"),
        ]);
        let user = &ws.files()[1];
        let callee = |needle: &str| {
            let offset = user.source.find(needle).unwrap();
            let mut node = user.tree.root_node().descendant_for_byte_range(offset, offset + needle.len()).unwrap();
            while node.kind() != "navigation_expression" {
                node = node.parent().unwrap();
            }
            node
        };

        let qualified = ws.resolve_reference(user, callee("x.y.Target")).unwrap();
        assert_eq!(qualified.path(), Path::new("x/Target.kt"));
        assert!(ws.resolve_reference(user, callee("verdi.Target")).is_none());
    }

    #[test]
    fn test_ambiguous_names_do_not_resolve() {
        let ws = workspace(&[
            ("a/Dup.kt", "package a\nclass Dup\n"),
            ("b/Dup.kt", "package b\nclass Dup\n"),
            ("c/User.kt", "package c\nfun f() = Dup()\n"),
        ]);
        let user = &ws.files()[2];

        assert!(ws.resolve_name(user, "Dup").is_none());
        assert!(ws.resolve_name(user, "Missing").is_none());
    }

    #[test]
    fn test_resolve_nullable_and_qualified_types() {
        let ws = workspace(&[
            ("a/Resp.kt", "package a\nclass Resp\n"),
            ("b/S.kt", "package b\nclass S(val r: a.Resp?, val q: a.Resp)\n"),
        ]);
        let file = &ws.files()[1];
        let class = child_of_kind(file.tree.root_node(), "class_declaration").unwrap();
        let constructor = child_of_kind(class, "primary_constructor").unwrap();

        for parameter in children_of_kind(constructor, "class_parameter") {
            let type_node = crate::core::syntax::declared_type(parameter).unwrap();
            let resolved = ws.resolve_type(file, type_node).unwrap();
            assert_eq!(resolved.name(), "Resp");
            assert_eq!(resolved.kind, DeclarationKind::Class);
        }
    }

    #[test]
    fn test_abstract_and_interface_are_not_concrete() {
        let ws = workspace(&[(
            "A.kt",
            "abstract class Base\ninterface Marker\nclass Concrete : Base()\nobject Obj\n",
        )]);

        let concrete: Vec<_> = ws
            .declarations()
            .into_iter()
            .filter(|d| d.is_concrete())
            .map(|d| d.name())
            .collect();
        assert_eq!(concrete, vec!["Concrete", "Obj"]);
    }
}
