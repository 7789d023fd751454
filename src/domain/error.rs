use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("incorrect number of arguments: expected {expected}, got {actual}")]
    Arity { expected: String, actual: usize },
    #[error("invalid argument: {0}")]
    Argument(String),
    #[error("invalid key: {0}")]
    Key(String),
    #[error("no state found for key {0}")]
    NotFound(String),
    #[error("storage operation failed: {0}")]
    Storage(String),
    #[error("rich query failed: {0}")]
    Query(String),
}

impl LedgerError {
    pub fn arity<E: std::fmt::Display>(expected: E, actual: usize) -> Self {
        Self::Arity {
            expected: expected.to_string(),
            actual,
        }
    }

    pub fn argument<E: std::fmt::Display>(error: E) -> Self {
        Self::Argument(error.to_string())
    }

    pub fn key<E: std::fmt::Display>(error: E) -> Self {
        Self::Key(error.to_string())
    }

    pub fn storage<E: std::fmt::Display>(error: E) -> Self {
        Self::Storage(error.to_string())
    }

    pub fn query<E: std::fmt::Display>(error: E) -> Self {
        Self::Query(error.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
