//! Per-declaration extraction and collection of the results.

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ExtractError;
use super::classifier::{Role, RoleClassifier};
use super::decoder::FlowDecoder;
use super::harvest::harvest;
use super::model::{DocumentationSet, ExtractionFailure, FlowDoc, ServiceDoc, SetDoc};
use super::resolver::SymbolResolver;
use super::shape::ShapeExtractor;
use super::super::locator::RepositoryLocator;
use super::super::workspace::{Declaration, Workspace};

/// Result of processing one declaration
#[derive(Debug)]
enum Outcome {
    Service(ServiceDoc),
    Flow(FlowDoc),
    Set(SetDoc),
    Failed(ExtractionFailure),
    Skipped,
}

/// Runs classification, shape extraction and flow decoding for every
/// declaration of a workspace
pub struct DocumentationAssembler<'a> {
    workspace: &'a Workspace,
    locator: &'a RepositoryLocator,
    classifier: RoleClassifier<'a>,
    shapes: ShapeExtractor<'a, 'a>,
    decoder: FlowDecoder<'a, 'a>,
    batch_size: usize,
    workers: usize,
}

impl<'a> DocumentationAssembler<'a> {
    pub fn new(workspace: &'a Workspace, config: &'a Config, locator: &'a RepositoryLocator) -> Self {
        let resolver = SymbolResolver::new(workspace);
        let classifier = RoleClassifier::new(&config.markers);

        Self {
            workspace,
            locator,
            classifier,
            shapes: ShapeExtractor::new(resolver, classifier),
            decoder: FlowDecoder::new(resolver, classifier, &config.vocabulary),
            batch_size: config.extraction.batch_size.max(1),
            workers: config.extraction.workers,
        }
    }

    /// Process every concrete declaration in bounded batches on a worker pool.
    /// Each collection of the result is sorted by name.
    pub fn assemble(&self) -> DocumentationSet {
        let declarations: Vec<Declaration<'a>> = self
            .workspace
            .declarations()
            .into_iter()
            .filter(|decl| decl.is_concrete())
            .collect();
        info!("Extracting documentation from {} declarations", declarations.len());

        let pool = self.build_pool();
        let mut documentation = DocumentationSet::default();

        for (index, batch) in declarations.chunks(self.batch_size).enumerate() {
            debug!("Batch {} ({} declarations)", index + 1, batch.len());

            let outcomes: Vec<Outcome> = match &pool {
                Some(pool) => pool.install(|| batch.par_iter().map(|decl| self.extract(decl)).collect()),
                None => batch.iter().map(|decl| self.extract(decl)).collect(),
            };

            for outcome in outcomes {
                match outcome {
                    Outcome::Service(doc) => documentation.services.push(doc),
                    Outcome::Flow(doc) => documentation.flows.push(doc),
                    Outcome::Set(doc) => documentation.sets.push(doc),
                    Outcome::Failed(failure) => documentation.failures.push(failure),
                    Outcome::Skipped => {}
                }
            }
        }

        documentation.services.sort_by(|a, b| a.name.cmp(&b.name));
        documentation.flows.sort_by(|a, b| a.name.cmp(&b.name));
        documentation.sets.sort_by(|a, b| a.name.cmp(&b.name));

        info!(
            "Extracted {} services, {} flows, {} sets ({} failed)",
            documentation.services.len(),
            documentation.flows.len(),
            documentation.sets.len(),
            documentation.failures.len()
        );
        documentation
    }

    fn build_pool(&self) -> Option<ThreadPool> {
        match rayon::ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("Could not start extraction workers, continuing sequentially: {}", e);
                None
            }
        }
    }

    /// Declaration-scoped boundary: every extraction error ends here
    fn extract(&self, decl: &Declaration<'a>) -> Outcome {
        let Some(role) = self.classifier.classify(decl) else {
            return Outcome::Skipped;
        };

        match self.extract_role(decl, role) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!("Skipping {} {} ({}): {}", role, decl.name(), decl.path().display(), error);
                Outcome::Failed(ExtractionFailure {
                    name: decl.name().to_string(),
                    source_file: decl.path().to_path_buf(),
                    error,
                })
            }
        }
    }

    fn extract_role(&self, decl: &Declaration<'a>, role: Role) -> Result<Outcome, ExtractError> {
        let name = decl.name().to_string();
        let description = harvest(decl.file, decl.node);
        let source_file = decl.path().to_path_buf();
        let source_uri = self.locator.to_external_uri(decl.path());

        let statements = self.decoder.entry_statements(decl, self.classifier.entry_member(role))?;

        let outcome = match role {
            Role::Service => {
                let response_type = self.classifier.service_response_type(decl)?;
                let input_fields = self.shapes.input_fields(decl, role)?;
                let output_fields = self.shapes.output_fields(decl, &response_type)?;
                let flow = self.decoder.decode(decl.file, &statements, role.into())?;
                Outcome::Service(ServiceDoc {
                    name,
                    description,
                    input_fields,
                    output_fields,
                    flow,
                    source_file,
                    source_uri,
                })
            }
            Role::Flow => Outcome::Flow(FlowDoc {
                input_fields: self.shapes.input_fields(decl, role)?,
                flow: self.decoder.decode(decl.file, &statements, role.into())?,
                name,
                description,
                source_file,
                source_uri,
            }),
            Role::Set => Outcome::Set(SetDoc {
                input_fields: self.shapes.input_fields(decl, role)?,
                flow: self.decoder.decode(decl.file, &statements, role.into())?,
                name,
                description,
                source_file,
                source_uri,
            }),
        };

        Ok(outcome)
    }
}
