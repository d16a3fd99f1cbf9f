use tree_sitter::Node;

use crate::error::ExtractError;
use super::super::parser::ParsedFile;
use super::super::workspace::{Declaration, Workspace};

/// Resolves reference and type nodes to declarations of the workspace.
///
/// Anything the workspace cannot place (library types, ambiguous names,
/// nodes that are not references) becomes [`ExtractError::NotFound`]; callers
/// decide whether that is fatal.
#[derive(Debug, Clone, Copy)]
pub struct SymbolResolver<'a> {
    workspace: &'a Workspace,
}

impl<'a> SymbolResolver<'a> {
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    pub fn resolve_reference(&self, file: &ParsedFile, node: Node) -> Result<Declaration<'a>, ExtractError> {
        self.workspace
            .resolve_reference(file, node)
            .ok_or_else(|| ExtractError::not_found(format!("reference '{}'", file.text(node))))
    }

    pub fn resolve_type(&self, file: &ParsedFile, type_node: Node) -> Result<Declaration<'a>, ExtractError> {
        self.workspace
            .resolve_type(file, type_node)
            .ok_or_else(|| ExtractError::not_found(format!("type '{}'", file.text(type_node))))
    }
}
