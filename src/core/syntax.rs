//! Small helpers over the Kotlin tree-sitter grammar.
//!
//! The grammar exposes almost no field names, so lookups go by node kind.

use tree_sitter::Node;

/// Node kinds that denote a type in declarations
pub const TYPE_KINDS: &[&str] = &[
    "user_type",
    "nullable_type",
    "function_type",
    "parenthesized_type",
    "non_nullable_type",
];

/// Extract text content of a node
pub fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// Find the first direct child of a given kind
pub fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

/// All direct children of a given kind, in source order
pub fn children_of_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect()
}

pub fn is_comment(node: Node) -> bool {
    matches!(node.kind(), "line_comment" | "multiline_comment")
}

/// Named, non-comment children of a `statements` node
pub fn statement_nodes(statements: Node) -> Vec<Node> {
    let mut cursor = statements.walk();
    statements.named_children(&mut cursor)
        .filter(|child| !is_comment(*child))
        .collect()
}

/// Statements inside a lambda literal; an empty lambda yields none
pub fn lambda_statements(lambda: Node) -> Vec<Node> {
    child_of_kind(lambda, "statements")
        .map(statement_nodes)
        .unwrap_or_default()
}

/// First type node among the direct children of a parameter or variable declaration
pub fn declared_type(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|child| TYPE_KINDS.contains(&child.kind()));
    found
}

/// Strip the nullable marker and projections down to the plain `user_type`
pub fn unwrap_type(node: Node) -> Option<Node> {
    match node.kind() {
        "user_type" => Some(node),
        "nullable_type" | "non_nullable_type" | "parenthesized_type" | "type_projection" => {
            let mut cursor = node.walk();
            let inner = node.named_children(&mut cursor).find(|child| !is_comment(*child));
            inner.and_then(unwrap_type)
        }
        _ => None,
    }
}

/// Dotted segments of a `user_type`, without type arguments
pub fn type_segments<'s>(user_type: Node, source: &'s str) -> Vec<&'s str> {
    children_of_kind(user_type, "type_identifier")
        .into_iter()
        .map(|segment| node_text(segment, source))
        .collect()
}

/// Whether a modifier list on `node` contains `override`
pub fn has_override(node: Node, source: &str) -> bool {
    child_of_kind(node, "modifiers")
        .map(|modifiers| {
            children_of_kind(modifiers, "member_modifier")
                .into_iter()
                .any(|modifier| node_text(modifier, source) == "override")
        })
        .unwrap_or(false)
}

/// Whether `node` is an identifier or a dotted chain of identifiers such as `a.b.C`
pub fn is_dotted_path(node: Node) -> bool {
    match node.kind() {
        "simple_identifier" => true,
        "navigation_expression" => {
            let (Some(receiver), Some(suffix)) = (node.named_child(0), node.named_child(1)) else {
                return false;
            };
            node.named_child_count() == 2
                && is_dotted_path(receiver)
                && suffix.kind() == "navigation_suffix"
                && suffix.named_child(0).map(|name| name.kind()) == Some("simple_identifier")
        }
        _ => false,
    }
}

/// Content of a string literal without its delimiters. Templates are kept verbatim.
pub fn string_literal_value(node: Node, source: &str) -> String {
    let text = node_text(node, source);
    let inner = if text.len() >= 6 && text.starts_with("\"\"\"") && text.ends_with("\"\"\"") {
        &text[3..text.len() - 3]
    } else if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    };
    inner.to_string()
}

/// A call expression flattened across the grammar's nesting of
/// `name(args) { lambda }` into one view.
#[derive(Debug, Clone)]
pub struct CallSite<'t> {
    /// The whole call expression
    pub node: Node<'t>,
    /// The called expression: a `simple_identifier` for plain calls,
    /// a `navigation_expression` for member calls
    pub callee: Node<'t>,
    /// Argument expressions in order, with `name =` prefixes dropped
    pub arguments: Vec<Node<'t>>,
    /// Trailing lambda literal, if any
    pub lambda: Option<Node<'t>>,
}

impl<'t> CallSite<'t> {
    pub fn parse(node: Node<'t>) -> Option<Self> {
        if node.kind() != "call_expression" {
            return None;
        }

        let function = node.named_child(0)?;
        let suffix = child_of_kind(node, "call_suffix")?;
        let mut arguments = suffix_arguments(suffix);
        let lambda = suffix_lambda(suffix);
        let mut callee = function;

        // `name(args) { ... }` parses as a call whose callee is `name(args)`
        if function.kind() == "call_expression" && lambda.is_some() && arguments.is_empty() {
            if let Some(inner_suffix) = child_of_kind(function, "call_suffix") {
                if suffix_lambda(inner_suffix).is_none() {
                    if let Some(inner_function) = function.named_child(0) {
                        arguments = suffix_arguments(inner_suffix);
                        callee = inner_function;
                    }
                }
            }
        }

        Some(Self { node, callee, arguments, lambda })
    }

    /// Name of a plain call such as `foo(...)`
    pub fn simple_name<'s>(&self, source: &'s str) -> Option<&'s str> {
        (self.callee.kind() == "simple_identifier").then(|| node_text(self.callee, source))
    }

    /// Last segment of a qualified call such as `a.b.foo(...)`
    pub fn qualified_name<'s>(&self, source: &'s str) -> Option<&'s str> {
        if self.callee.kind() != "navigation_expression" || !is_dotted_path(self.callee) {
            return None;
        }
        let suffix = self.callee.named_child(1)?;
        suffix.named_child(0).map(|name| node_text(name, source))
    }

    /// Value of the first argument that is a string literal
    pub fn first_string_argument(&self, source: &str) -> Option<String> {
        self.arguments
            .iter()
            .find(|argument| argument.kind() == "string_literal")
            .map(|argument| string_literal_value(*argument, source))
    }

    /// For `Receiver(args).member(...)`, the `Receiver` identifier or
    /// dotted path (`a.b.Receiver`)
    pub fn constructed_receiver(&self) -> Option<Node<'t>> {
        if self.callee.kind() != "navigation_expression" {
            return None;
        }
        let receiver = self.callee.named_child(0)?;
        if receiver.kind() != "call_expression" {
            return None;
        }
        let path = receiver.named_child(0)?;
        is_dotted_path(path).then_some(path)
    }
}

fn suffix_arguments(suffix: Node) -> Vec<Node> {
    let Some(arguments) = child_of_kind(suffix, "value_arguments") else {
        return Vec::new();
    };

    children_of_kind(arguments, "value_argument")
        .into_iter()
        .filter_map(|argument| {
            let mut cursor = argument.walk();
            let last = argument.named_children(&mut cursor)
                .filter(|child| !is_comment(*child))
                .last();
            last
        })
        .collect()
}

fn suffix_lambda(suffix: Node) -> Option<Node> {
    child_of_kind(suffix, "annotated_lambda").and_then(|annotated| child_of_kind(annotated, "lambda_literal"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::{Parser, Tree};

    fn parse(source: &str) -> Tree {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_kotlin::language()).unwrap();
        parser.parse(source, None).unwrap()
    }

    fn first_call(tree: &Tree) -> Node {
        let root = tree.root_node();
        let function = child_of_kind(root, "function_declaration").unwrap();
        let body = child_of_kind(function, "function_body").unwrap();
        let statements = child_of_kind(body, "statements").unwrap();
        statement_nodes(statements)[0]
    }

    #[test]
    fn test_call_with_arguments_and_trailing_lambda() {
        let source = "fun f() {\n    forgrening(\"Input ok?\", 2) { gren { } }\n}\n";
        let tree = parse(source);
        let call = CallSite::parse(first_call(&tree)).unwrap();

        assert_eq!(call.simple_name(source), Some("forgrening"));
        assert_eq!(call.arguments.len(), 2);
        assert_eq!(call.first_string_argument(source).as_deref(), Some("Input ok?"));
        assert_eq!(lambda_statements(call.lambda.unwrap()).len(), 1);
    }

    #[test]
    fn test_lambda_only_call() {
        let source = "fun f() {\n    flyt { A()\n B() }\n}\n";
        let tree = parse(source);
        let call = CallSite::parse(first_call(&tree)).unwrap();

        assert_eq!(call.simple_name(source), Some("flyt"));
        assert!(call.arguments.is_empty());
        assert_eq!(lambda_statements(call.lambda.unwrap()).len(), 2);
    }

    #[test]
    fn test_named_argument_is_unwrapped() {
        let source = "fun f() {\n    betingelse(label = \"Tom\") { x }\n}\n";
        let tree = parse(source);
        let call = CallSite::parse(first_call(&tree)).unwrap();

        assert_eq!(call.first_string_argument(source).as_deref(), Some("Tom"));
    }

    #[test]
    fn test_constructed_receiver() {
        let source = "fun f() {\n    SomeOtherFlow(arg).run(this)\n}\n";
        let tree = parse(source);
        let call = CallSite::parse(first_call(&tree)).unwrap();

        assert_eq!(call.simple_name(source), None);
        let receiver = call.constructed_receiver().unwrap();
        assert_eq!(node_text(receiver, source), "SomeOtherFlow");
    }

    #[test]
    fn test_qualified_call_and_receiver() {
        let source = "fun f() {\n    regler.steg.C()\n    regler.flyt.SomeOtherFlow(arg).run(this)\n    lag().run(this)\n}\n";
        let tree = parse(source);
        let root = tree.root_node();
        let body = child_of_kind(child_of_kind(root, "function_declaration").unwrap(), "function_body").unwrap();
        let calls: Vec<_> = statement_nodes(child_of_kind(body, "statements").unwrap())
            .into_iter()
            .map(|node| CallSite::parse(node).unwrap())
            .collect();

        assert_eq!(calls[0].qualified_name(source), Some("C"));
        assert!(calls[0].constructed_receiver().is_none());

        assert_eq!(calls[1].qualified_name(source), None);
        let receiver = calls[1].constructed_receiver().unwrap();
        assert_eq!(node_text(receiver, source), "regler.flyt.SomeOtherFlow");

        assert_eq!(node_text(calls[2].constructed_receiver().unwrap(), source), "lag");
    }

    #[test]
    fn test_string_literal_value() {
        let source = "fun f() {\n    g(\"\"\"raw\"\"\", \"L $x\")\n}\n";
        let tree = parse(source);
        let call = CallSite::parse(first_call(&tree)).unwrap();

        assert_eq!(string_literal_value(call.arguments[0], source), "raw");
        assert_eq!(string_literal_value(call.arguments[1], source), "L $x");
    }
}
