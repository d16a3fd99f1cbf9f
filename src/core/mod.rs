mod engine;
mod parser;
mod validator;
mod locator;
mod workspace;

// Tree-sitter helpers and language-specific parsers
mod syntax;
mod languages;

// Extraction engine and output
mod extract;
mod render;

pub use parser::{ParsedFile, SourceLoader};
pub use validator::DocValidator;
pub use locator::RepositoryLocator;
pub use workspace::Workspace;
pub use extract::{DocumentationAssembler, DocumentationSet};
pub use render::{create_renderer, write_pages, RenderOptions};

// Export the main engine
pub use engine::Engine;
