//! Error types for spec-oracle
//!
//! Only the outer surfaces (specification loading, guard evaluation,
//! configuration) can fail. Classification itself is total.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// spec-oracle errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Specification parse error: {0}")]
    SpecParse(String),

    #[error("CEL parse error: {0}")]
    CelParse(String),

    #[error("CEL evaluation error: {0}")]
    CelEval(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
