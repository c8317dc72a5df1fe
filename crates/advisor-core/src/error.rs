//! Error types for the Advisor pipeline

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the Advisor system
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("embedding dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("indexing failed for document '{document_id}': {cause}")]
    IndexingFailed { document_id: String, cause: String },

    #[error("document has no extractable text")]
    EmptyDocument,

    #[error("provider error: {0}")]
    Provider(String),

    #[error("provider timed out: {0}")]
    Timeout(String),

    #[error("vector index error: {0}")]
    VectorIndex(String),

    #[error("history ledger error: {0}")]
    History(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a retry at the call site can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Provider(_) | Error::Timeout(_) | Error::Network(_)
        )
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Provider(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
