// src/error.rs
use thiserror::Error;

/// A vocabulary that cannot be used to build or classify.
#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("Failed to read vocabulary file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid vocabulary JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Vocabulary declares no categories")]
    NoCategories,

    #[error("Fallback category '{0}' is not in the category set")]
    UnknownFallback(String),

    #[error("{table}: '{key}' maps to unknown category '{category}'")]
    UnknownCategory {
        table: &'static str,
        key: String,
        category: String,
    },

    #[error("{table}: key '{raw}' is empty after normalization")]
    EmptyKey { table: &'static str, raw: String },

    #[error("{table}: '{key}' appears more than once after normalization")]
    DuplicateKey { table: &'static str, key: String },

    #[error("first_token_overrides: lookup table does not match the override list")]
    InconsistentOverrides,

    #[error("first_token_overrides: '{0}' is a stopword")]
    StopwordOverride(String),

    #[error("first_token_overrides: '{0}' is not a single token")]
    MultiTokenOverride(String),
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Raw dictionary must be a JSON object, found {0}")]
    NotAMapping(&'static str),

    #[error("Invalid raw dictionary JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Failed to read raw dictionary: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Snapshot persist failed: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Engine has no compiled index to save")]
    Unbuilt,

    #[error("Snapshot index uses category '{0}' outside its vocabulary")]
    ForeignCategory(String),

    #[error("Snapshot was built from a different vocabulary or dictionary")]
    Stale,
}
