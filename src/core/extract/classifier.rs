//! Role classification by textual supertype inspection.
//!
//! A declaration's role is read off the names of its listed supertypes: a
//! supertype matches when its name contains one of the configured marker
//! strings. Nothing is resolved here, so aliased imports or renamed base
//! classes are not recognised.

use serde::Serialize;
use tree_sitter::Node;

use crate::config::MarkerConfig;
use crate::error::ExtractError;
use super::super::parser::ParsedFile;
use super::super::syntax::{child_of_kind, children_of_kind, is_comment, type_segments, TYPE_KINDS};
use super::super::workspace::Declaration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    Service,
    Flow,
    Set,
}

impl Role {
    const ALL: [Role; 3] = [Role::Service, Role::Flow, Role::Set];
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Service => write!(f, "service"),
            Role::Flow => write!(f, "flow"),
            Role::Set => write!(f, "set"),
        }
    }
}

/// A type as written in a declaration, together with the file it was written in
#[derive(Debug, Clone, Copy)]
pub struct TypeRef<'a> {
    pub file: &'a ParsedFile,
    pub node: Node<'a>,
}

impl<'a> TypeRef<'a> {
    pub fn text(&self) -> &'a str {
        self.file.text(self.node)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoleClassifier<'c> {
    markers: &'c MarkerConfig,
}

impl<'c> RoleClassifier<'c> {
    pub fn new(markers: &'c MarkerConfig) -> Self {
        Self { markers }
    }

    /// First matching role over the supertypes in source order
    pub fn classify(&self, decl: &Declaration) -> Option<Role> {
        supertypes(decl.node).into_iter().find_map(|supertype| {
            let name = supertype_name(decl.file, supertype);
            Role::ALL
                .into_iter()
                .find(|role| contains_marker(&name, self.markers_for(*role)))
        })
    }

    /// First generic argument of the service marker supertype
    pub fn service_response_type<'a>(&self, decl: &Declaration<'a>) -> Result<TypeRef<'a>, ExtractError> {
        let supertype = supertypes(decl.node)
            .into_iter()
            .find(|supertype| contains_marker(&supertype_name(decl.file, *supertype), &self.markers.service))
            .ok_or_else(|| ExtractError::not_found("no response type"))?;

        let node = child_of_kind(supertype, "type_arguments")
            .and_then(|arguments| child_of_kind(arguments, "type_projection"))
            .and_then(|projection| {
                let mut cursor = projection.walk();
                let found = projection
                    .named_children(&mut cursor)
                    .find(|child| !is_comment(*child) && TYPE_KINDS.contains(&child.kind()));
                found
            })
            .ok_or_else(|| ExtractError::not_found("no response type"))?;

        Ok(TypeRef { file: decl.file, node })
    }

    /// Whether a direct supertype carries a request marker
    pub fn is_request_like(&self, decl: &Declaration) -> bool {
        supertypes(decl.node)
            .into_iter()
            .any(|supertype| contains_marker(&supertype_name(decl.file, supertype), &self.markers.request))
    }

    /// Overridden member holding the steps of a declaration with this role
    pub fn entry_member(&self, role: Role) -> &'c str {
        match role {
            Role::Service => &self.markers.service_entry,
            Role::Flow => &self.markers.flow_entry,
            Role::Set => &self.markers.set_entry,
        }
    }

    fn markers_for(&self, role: Role) -> &'c [String] {
        match role {
            Role::Service => &self.markers.service,
            Role::Flow => &self.markers.flow,
            Role::Set => &self.markers.set,
        }
    }
}

fn contains_marker(name: &str, markers: &[String]) -> bool {
    markers.iter().any(|marker| name.contains(marker.as_str()))
}

/// The `user_type` of every listed supertype, in source order
fn supertypes(declaration: Node) -> Vec<Node> {
    children_of_kind(declaration, "delegation_specifier")
        .into_iter()
        .filter_map(|specifier| {
            let mut cursor = specifier.walk();
            let inner = specifier.named_children(&mut cursor).find(|child| !is_comment(*child));
            inner
        })
        .filter_map(|inner| match inner.kind() {
            "user_type" => Some(inner),
            "constructor_invocation" | "explicit_delegation" => child_of_kind(inner, "user_type"),
            _ => None,
        })
        .collect()
}

/// Dotted name of a supertype without its type arguments
fn supertype_name(file: &ParsedFile, user_type: Node) -> String {
    type_segments(user_type, &file.source).join(".")
}
