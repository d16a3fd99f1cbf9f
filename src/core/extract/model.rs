//! Documentation model produced by extraction.
//!
//! Every value here is built once per run and never mutated afterwards.

use serde::Serialize;
use std::path::PathBuf;

use crate::error::ExtractError;

/// One data field: a constructor parameter or a class member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub declared_type: String,
    pub description: String,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            description: description.into(),
        }
    }
}

/// Guard of a branch. `expression` is kept verbatim and never evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionDescriptor {
    pub label: String,
    pub expression: String,
}

/// Straight-line sequence of flow elements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Flow {
    pub elements: Vec<FlowElement>,
}

impl Flow {
    pub fn new(elements: Vec<FlowElement>) -> Self {
        Self { elements }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Node of a decoded flow tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum FlowElement {
    /// Nested sequence. Sub-flow groupings are spliced, so the decoder never
    /// emits this at statement level.
    #[allow(dead_code)]
    Flow(Flow),
    Invocation { name: String, source_file: PathBuf },
    FlowReference { name: String, source_file: PathBuf },
    SetReference { name: String, source_file: PathBuf },
    BranchPoint(BranchPoint),
    /// Branches only live inside a [`BranchPoint`]
    #[allow(dead_code)]
    Branch(Branch),
}

/// Decision node. Always holds at least one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchPoint {
    name: String,
    description: String,
    branches: Vec<Branch>,
}

impl BranchPoint {
    pub fn new(name: String, description: String, branches: Vec<Branch>) -> Result<Self, ExtractError> {
        if branches.is_empty() {
            return Err(ExtractError::EmptyBranchPoint { name });
        }
        Ok(Self { name, description, branches })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub description: String,
    pub condition: ConditionDescriptor,
    pub body: Flow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDoc {
    pub name: String,
    pub description: String,
    pub input_fields: Vec<FieldDescriptor>,
    pub output_fields: Vec<FieldDescriptor>,
    pub flow: Flow,
    pub source_file: PathBuf,
    pub source_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowDoc {
    pub name: String,
    pub description: String,
    pub input_fields: Vec<FieldDescriptor>,
    pub flow: Flow,
    pub source_file: PathBuf,
    pub source_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetDoc {
    pub name: String,
    pub description: String,
    pub input_fields: Vec<FieldDescriptor>,
    pub flow: Flow,
    pub source_file: PathBuf,
    pub source_uri: String,
}

/// Shared view over the three aggregate kinds
pub trait AggregateDoc {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_fields(&self) -> &[FieldDescriptor];
    fn flow(&self) -> &Flow;
    fn source_file(&self) -> &std::path::Path;
    fn source_uri(&self) -> &str;

    /// Only services have an output shape
    fn output_fields(&self) -> &[FieldDescriptor] {
        &[]
    }
}

macro_rules! impl_aggregate_doc {
    ($doc:ty $(, $output:ident)?) => {
        impl AggregateDoc for $doc {
            fn name(&self) -> &str { &self.name }
            fn description(&self) -> &str { &self.description }
            fn input_fields(&self) -> &[FieldDescriptor] { &self.input_fields }
            fn flow(&self) -> &Flow { &self.flow }
            fn source_file(&self) -> &std::path::Path { &self.source_file }
            fn source_uri(&self) -> &str { &self.source_uri }
            $(fn output_fields(&self) -> &[FieldDescriptor] { &self.$output })?
        }
    };
}

impl_aggregate_doc!(ServiceDoc, output_fields);
impl_aggregate_doc!(FlowDoc);
impl_aggregate_doc!(SetDoc);

/// A declaration that matched a role but could not be documented
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionFailure {
    pub name: String,
    pub source_file: PathBuf,
    pub error: ExtractError,
}

/// Everything one run extracted, each collection sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentationSet {
    pub services: Vec<ServiceDoc>,
    pub flows: Vec<FlowDoc>,
    pub sets: Vec<SetDoc>,
    pub failures: Vec<ExtractionFailure>,
}

impl DocumentationSet {
    pub fn len(&self) -> usize {
        self.services.len() + self.flows.len() + self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(expression: &str) -> Branch {
        Branch {
            description: String::new(),
            condition: ConditionDescriptor { label: String::new(), expression: expression.to_string() },
            body: Flow::default(),
        }
    }

    #[test]
    fn test_branch_point_requires_branches() {
        let error = BranchPoint::new("Tom".to_string(), String::new(), vec![]).unwrap_err();
        assert_eq!(error, ExtractError::EmptyBranchPoint { name: "Tom".to_string() });

        let point = BranchPoint::new("Ok".to_string(), String::new(), vec![branch("a")]).unwrap();
        assert_eq!(point.branches().len(), 1);
        assert_eq!(point.name(), "Ok");
    }

    #[test]
    fn test_flow_elements_are_tagged() {
        let element = FlowElement::FlowReference {
            name: "BeregnFlyt".to_string(),
            source_file: PathBuf::from("a/BeregnFlyt.kt"),
        };
        let json = serde_json::to_value(&element).unwrap();

        assert_eq!(json["type"], "FlowReference");
        assert_eq!(json["name"], "BeregnFlyt");
        assert_eq!(json["source_file"], "a/BeregnFlyt.kt");
    }

    #[test]
    fn test_only_services_have_output_fields() {
        let flow = FlowDoc {
            name: "F".to_string(),
            description: String::new(),
            input_fields: vec![FieldDescriptor::new("p", "Int", "")],
            flow: Flow::default(),
            source_file: PathBuf::from("F.kt"),
            source_uri: String::new(),
        };

        assert!(flow.output_fields().is_empty());
        assert_eq!(flow.input_fields().len(), 1);
    }

    #[test]
    fn test_failures_do_not_count_as_documentation() {
        let mut docs = DocumentationSet::default();
        docs.failures.push(ExtractionFailure {
            name: "Brutt".to_string(),
            source_file: PathBuf::from("Brutt.kt"),
            error: ExtractError::MissingCondition,
        });

        assert!(docs.is_empty());
        assert_eq!(docs.len(), 0);
    }
}
