use super::extract::{AggregateDoc, DocumentationSet, Flow, FlowElement};

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Health checks over an extracted documentation set.
///
/// Declarations that could not be documented are errors; gaps that still
/// produce a page (missing descriptions, empty flows, single-branch decisions)
/// are warnings.
#[derive(Debug, Default)]
pub struct DocValidator;

impl DocValidator {
    pub fn validate(&self, docs: &DocumentationSet) -> ValidationResult {
        let mut result = ValidationResult::default();

        for failure in &docs.failures {
            result.errors.push(format!(
                "{} ({}): {}",
                failure.name,
                failure.source_file.display(),
                failure.error
            ));
        }

        let aggregates = docs
            .services
            .iter()
            .map(|doc| doc as &dyn AggregateDoc)
            .chain(docs.flows.iter().map(|doc| doc as &dyn AggregateDoc))
            .chain(docs.sets.iter().map(|doc| doc as &dyn AggregateDoc));

        for doc in aggregates {
            self.check_aggregate(doc, &mut result);
        }

        result
    }

    fn check_aggregate(&self, doc: &dyn AggregateDoc, result: &mut ValidationResult) {
        if doc.description().is_empty() {
            result.warnings.push(format!("{} has no documentation comment", doc.name()));
        }

        if doc.flow().is_empty() {
            result.warnings.push(format!("{} has no documented steps", doc.name()));
        }

        check_flow(doc.name(), doc.flow(), result);
    }
}

fn check_flow(owner: &str, flow: &Flow, result: &mut ValidationResult) {
    for element in &flow.elements {
        match element {
            FlowElement::BranchPoint(point) => {
                if point.branches().len() == 1 {
                    result.warnings.push(format!(
                        "{}: branch point '{}' has a single branch",
                        owner,
                        point.name()
                    ));
                }
                for branch in point.branches() {
                    check_flow(owner, &branch.body, result);
                }
            }
            FlowElement::Flow(inner) => check_flow(owner, inner, result),
            FlowElement::Branch(branch) => check_flow(owner, &branch.body, result),
            FlowElement::Invocation { .. } | FlowElement::FlowReference { .. } | FlowElement::SetReference { .. } => {}
        }
    }
}
