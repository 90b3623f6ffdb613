//! Error types for the jcc core library.
//!
//! Only conditions that make a run meaningless are errors.  Duplicate class
//! definitions and unresolved dependencies are accumulated into the report
//! instead (see `report::Diagnostic` and `rules::RuleId::UnresolvedDependency`).

/// Top-level error enum for the jcc core library.
#[derive(Debug, thiserror::Error)]
pub enum JccError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type JccResult<T> = Result<T, JccError>;
