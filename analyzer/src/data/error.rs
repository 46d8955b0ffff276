//! Unified error type for validation infrastructure
//!
//! SQL errors in the validated query are not errors here; providers report them
//! as [`Outcome::Failure`](crate::domain::Outcome). This type covers everything
//! that prevented an answer from being produced.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The host cancelled the analysis. Never cached, never turned into a diagnostic.
    #[error("Analysis cancelled")]
    Cancelled,

    /// Database driver error (connectivity, pool, IO)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Provider-specific failure
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_display() {
        let err = AnalysisError::Cancelled;
        assert_eq!(err.to_string(), "Analysis cancelled");
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_provider_error_display() {
        let err = AnalysisError::provider("connection refused");
        assert_eq!(err.to_string(), "Provider error: connection refused");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_config_error_display() {
        let err = AnalysisError::Config("invalid connection string".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: invalid connection string"
        );
    }

    #[test]
    fn test_database_error_from() {
        let err: AnalysisError = sqlx::Error::PoolTimedOut.into();
        assert!(err.to_string().starts_with("Database error:"));
    }
}
