//! Error types shared across the crate.

use thiserror::Error;

/// Result type for fallible wordbag operations
pub type Result<T> = std::result::Result<T, WordbagError>;

/// Errors surfaced by loaders, checkpoints and configuration checks
///
/// Out-of-vocabulary words are never reported through this type: the
/// tokenizer drops them and embedding lookups return `None`.
#[derive(Error, Debug)]
pub enum WordbagError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Dataset error: {0}")]
    Dataset(String),
}
