//! Flow decoder.
//!
//! Rule flows describe their steps with a small call-based vocabulary:
//!
//! ```kotlin
//! forgrening("Input ok?") {
//!     gren {
//!         betingelse("Tom") { input.isEmpty() }
//!         flyt { AvslagFlyt(input).run(this) }
//!     }
//! }
//! ```
//!
//! Each statement of an entry point is first classified into a [`Statement`]
//! and then mapped to zero or more [`FlowElement`]s. Branch points recurse into
//! their branches, sub-flow groupings are decoded in place and spliced into the
//! surrounding sequence.

use tracing::trace;
use tree_sitter::Node;

use crate::config::VocabularyConfig;
use crate::error::ExtractError;
use super::classifier::{Role, RoleClassifier};
use super::harvest::harvest;
use super::model::{Branch, BranchPoint, ConditionDescriptor, Flow, FlowElement};
use super::resolver::SymbolResolver;
use super::super::parser::ParsedFile;
use super::super::syntax::{
    child_of_kind, children_of_kind, has_override, lambda_statements, statement_nodes, CallSite,
};
use super::super::workspace::Declaration;

/// Which statement shapes an entry point may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Plain calls and flow/set references only
    ServiceEntry,
    /// Additionally the branching vocabulary
    FlowOrSetEntry,
}

impl From<Role> for DecodeMode {
    fn from(role: Role) -> Self {
        match role {
            Role::Service => DecodeMode::ServiceEntry,
            Role::Flow | Role::Set => DecodeMode::FlowOrSetEntry,
        }
    }
}

/// Raw statement shapes recognised by the decoder
#[derive(Debug)]
enum Statement<'t> {
    BranchPoint(CallSite<'t>),
    Branch(CallSite<'t>),
    Condition(CallSite<'t>),
    SubFlow(CallSite<'t>),
    /// `name(...)` or `a.b.name(...)`
    Call { callee: Node<'t>, name: &'t str },
    /// `Receiver(...).member(...)` or `a.b.Receiver(...).member(...)`
    MemberCall { receiver: Node<'t> },
    Other,
}

#[derive(Debug, Clone, Copy)]
pub struct FlowDecoder<'a, 'c> {
    resolver: SymbolResolver<'a>,
    classifier: RoleClassifier<'c>,
    vocabulary: &'c VocabularyConfig,
}

impl<'a, 'c> FlowDecoder<'a, 'c> {
    pub fn new(resolver: SymbolResolver<'a>, classifier: RoleClassifier<'c>, vocabulary: &'c VocabularyConfig) -> Self {
        Self { resolver, classifier, vocabulary }
    }

    /// Statements of the overridden entry-point member `member`.
    ///
    /// The member is either a property initialised with a lambda or a function
    /// with a block body.
    pub fn entry_statements(&self, decl: &Declaration<'a>, member: &str) -> Result<Vec<Node<'a>>, ExtractError> {
        let missing = || ExtractError::not_found(format!("entry point '{}'", member));
        let body = child_of_kind(decl.node, "class_body").ok_or_else(missing)?;
        let source = &decl.file.source;

        for property in children_of_kind(body, "property_declaration") {
            let name = child_of_kind(property, "variable_declaration")
                .and_then(|variable| child_of_kind(variable, "simple_identifier"))
                .map(|name| decl.text(name));
            if name != Some(member) || !has_override(property, source) {
                continue;
            }

            let lambda = child_of_kind(property, "lambda_literal").ok_or_else(|| {
                ExtractError::invalid_shape(format!("entry point '{}' is not initialised with a lambda", member))
            })?;
            return Ok(lambda_statements(lambda));
        }

        for function in children_of_kind(body, "function_declaration") {
            let name = child_of_kind(function, "simple_identifier").map(|name| decl.text(name));
            if name != Some(member) || !has_override(function, source) {
                continue;
            }

            let function_body = child_of_kind(function, "function_body").ok_or_else(|| {
                ExtractError::invalid_shape(format!("entry point '{}' has no body", member))
            })?;
            if function_body.child(0).map(|token| token.kind()) == Some("=") {
                return Err(ExtractError::invalid_shape(format!(
                    "entry point '{}' has an expression body",
                    member
                )));
            }
            return Ok(child_of_kind(function_body, "statements")
                .map(statement_nodes)
                .unwrap_or_default());
        }

        Err(missing())
    }

    /// Decode a statement sequence of `file`
    pub fn decode(&self, file: &'a ParsedFile, statements: &[Node<'a>], mode: DecodeMode) -> Result<Flow, ExtractError> {
        let mut elements = Vec::new();
        for statement in statements {
            self.decode_statement(file, *statement, mode, &mut elements)?;
        }
        Ok(Flow::new(elements))
    }

    fn decode_statement(
        &self,
        file: &'a ParsedFile,
        statement: Node<'a>,
        mode: DecodeMode,
        elements: &mut Vec<FlowElement>,
    ) -> Result<(), ExtractError> {
        match self.classify(file, statement, mode) {
            Statement::BranchPoint(call) => {
                elements.push(FlowElement::BranchPoint(self.decode_branch_point(file, &call, mode)?));
            }
            Statement::SubFlow(call) => {
                let lambda = call.lambda.ok_or_else(|| {
                    ExtractError::invalid_shape(format!("'{}' without a body", self.vocabulary.sub_flow))
                })?;
                let spliced = self.decode(file, &lambda_statements(lambda), mode)?;
                elements.extend(spliced.elements);
            }
            Statement::Call { callee, name } => {
                if let Some(invocation) = self.invocation(file, callee, name) {
                    elements.push(invocation);
                }
            }
            Statement::MemberCall { receiver } => {
                if let Some(reference) = self.reference(file, receiver) {
                    elements.push(reference);
                }
            }
            Statement::Branch(_) | Statement::Condition(_) | Statement::Other => {
                trace!("Ignoring statement '{}'", first_line(file.text(statement)));
            }
        }
        Ok(())
    }

    fn classify(&self, file: &'a ParsedFile, node: Node<'a>, mode: DecodeMode) -> Statement<'a> {
        let Some(call) = CallSite::parse(node) else {
            return Statement::Other;
        };

        if let Some(name) = call.simple_name(&file.source) {
            if mode == DecodeMode::FlowOrSetEntry {
                let vocabulary = self.vocabulary;
                if name == vocabulary.branch_point {
                    return Statement::BranchPoint(call);
                } else if name == vocabulary.branch {
                    return Statement::Branch(call);
                } else if name == vocabulary.condition {
                    return Statement::Condition(call);
                } else if name == vocabulary.sub_flow {
                    return Statement::SubFlow(call);
                }
            } else if self.is_vocabulary(name) {
                return Statement::Other;
            }
            return Statement::Call { callee: call.callee, name };
        }

        if let Some(name) = call.qualified_name(&file.source) {
            return Statement::Call { callee: call.callee, name };
        }

        match call.constructed_receiver() {
            Some(receiver) => Statement::MemberCall { receiver },
            None => Statement::Other,
        }
    }

    fn is_vocabulary(&self, name: &str) -> bool {
        let vocabulary = self.vocabulary;
        [&vocabulary.branch_point, &vocabulary.branch, &vocabulary.condition, &vocabulary.sub_flow]
            .into_iter()
            .any(|word| word == name)
    }

    /// Plain call into a routine declared in another file
    fn invocation(&self, file: &ParsedFile, callee: Node, name: &str) -> Option<FlowElement> {
        let target = self.resolver.resolve_reference(file, callee).ok()?;
        if target.path() == file.path.as_path() {
            return None;
        }
        if matches!(self.classifier.classify(&target), Some(Role::Flow | Role::Set)) {
            return None;
        }

        Some(FlowElement::Invocation {
            name: name.to_string(),
            source_file: target.path().to_path_buf(),
        })
    }

    /// `Receiver(...).member(...)` where the receiver is a flow or set
    fn reference(&self, file: &ParsedFile, receiver: Node) -> Option<FlowElement> {
        let target = self.resolver.resolve_reference(file, receiver).ok()?;
        let name = target.name().to_string();
        let source_file = target.path().to_path_buf();

        match self.classifier.classify(&target)? {
            Role::Flow => Some(FlowElement::FlowReference { name, source_file }),
            Role::Set => Some(FlowElement::SetReference { name, source_file }),
            Role::Service => None,
        }
    }

    fn decode_branch_point(&self, file: &'a ParsedFile, call: &CallSite<'a>, mode: DecodeMode) -> Result<BranchPoint, ExtractError> {
        let name = call
            .first_string_argument(&file.source)
            .ok_or(ExtractError::MissingBranchName)?;
        let description = harvest(file, call.node);
        let lambda = call.lambda.ok_or_else(|| {
            ExtractError::invalid_shape(format!("branch point '{}' has no body", name))
        })?;

        let mut branches = Vec::new();
        for statement in lambda_statements(lambda) {
            if let Statement::Branch(branch) = self.classify(file, statement, mode) {
                branches.push(self.decode_branch(file, &branch, mode)?);
            }
        }

        BranchPoint::new(name, description, branches)
    }

    fn decode_branch(&self, file: &'a ParsedFile, call: &CallSite<'a>, mode: DecodeMode) -> Result<Branch, ExtractError> {
        let description = harvest(file, call.node);
        let lambda = call.lambda.ok_or(ExtractError::MissingCondition)?;

        let mut conditions = Vec::new();
        let mut sub_flows = Vec::new();
        for statement in lambda_statements(lambda) {
            match self.classify(file, statement, mode) {
                Statement::Condition(condition) => conditions.push(condition),
                Statement::SubFlow(sub_flow) => sub_flows.push(sub_flow),
                _ => {}
            }
        }

        let condition = match conditions.as_slice() {
            [] => return Err(ExtractError::MissingCondition),
            [condition] => decode_condition(file, condition)?,
            _ => return Err(ExtractError::invalid_shape("branch has more than one condition")),
        };

        if sub_flows.is_empty() {
            return Err(ExtractError::invalid_shape("branch has no sub-flow"));
        }
        let mut body = Flow::default();
        for sub_flow in &sub_flows {
            let sub_lambda = sub_flow
                .lambda
                .ok_or_else(|| ExtractError::invalid_shape("branch has no sub-flow"))?;
            body.elements
                .extend(self.decode(file, &lambda_statements(sub_lambda), mode)?.elements);
        }

        Ok(Branch { description, condition, body })
    }
}

/// Label from the first string argument, expression from the lambda body text
fn decode_condition(file: &ParsedFile, call: &CallSite) -> Result<ConditionDescriptor, ExtractError> {
    let label = call.first_string_argument(&file.source).unwrap_or_default();
    let expression = call
        .lambda
        .and_then(|lambda| child_of_kind(lambda, "statements"))
        .map(|statements| file.text(statements).trim().to_string())
        .filter(|expression| !expression.is_empty())
        .ok_or(ExtractError::MissingCondition)?;

    Ok(ConditionDescriptor { label, expression })
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
