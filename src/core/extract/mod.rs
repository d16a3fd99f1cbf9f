//! Extraction engine: classifies rule declarations and turns them into the
//! documentation model.

mod assembler;
mod classifier;
mod decoder;
mod harvest;
pub mod model;
mod resolver;
mod shape;

pub use assembler::DocumentationAssembler;
pub use harvest::DocIndex;
pub use model::*;
