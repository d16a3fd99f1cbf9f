use thiserror::Error;

/// Main error type for regeldoc operations
#[derive(Error, Debug)]
pub enum RegeldocError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Documentation validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, RegeldocError>;

/// Failure while extracting documentation for a single declaration.
///
/// Every variant is scoped to the declaration being processed; the assembler
/// records it and moves on to the next declaration.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum ExtractError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Branch point is missing its name argument")]
    MissingBranchName,

    #[error("Branch is missing its condition")]
    MissingCondition,

    #[error("Branch point '{name}' has no branches")]
    EmptyBranchPoint { name: String },

    #[error("Invalid shape: {0}")]
    InvalidShape(String),
}

impl ExtractError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ExtractError::NotFound(what.into())
    }

    pub fn invalid_shape(what: impl Into<String>) -> Self {
        ExtractError::InvalidShape(what.into())
    }
}
