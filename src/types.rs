//! Shared error type for the gateway

use thiserror::Error;

/// Errors surfaced by the catalog gateway.
///
/// Domain outcomes such as "project not found" or "access denied" are not
/// errors; they are variants of [`crate::services::ListingResult`].
#[derive(Error, Debug)]
pub enum GateError {
    /// The project or catalog data source failed (connectivity, corruption,
    /// interrupted statement).
    #[error("Database error: {0}")]
    Database(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Whether this error came from the catalog or project store
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(self, GateError::Database(_))
    }
}

impl From<rusqlite::Error> for GateError {
    fn from(e: rusqlite::Error) -> Self {
        GateError::Database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_failure_classification() {
        assert!(GateError::Database("down".into()).is_retrieval_failure());
        assert!(!GateError::Auth("bad".into()).is_retrieval_failure());
    }

    #[test]
    fn test_rusqlite_error_maps_to_database() {
        let err: GateError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(err.is_retrieval_failure());
    }
}
