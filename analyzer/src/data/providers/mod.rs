//! Validation providers
//!
//! A provider asks a real database for the shape of a query: its input
//! parameters and its output columns. SQL errors come back as
//! [`Outcome::Failure`]; infrastructure problems as [`AnalysisError`].
//!
//! - `sqlite` - describes queries through a read-only sqlx pool

mod sqlite;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use sqlite::SqliteValidationProvider;

use crate::data::error::AnalysisError;
use crate::domain::{Outcome, ValidatedQuery};

/// Provider trait for query validation
///
/// Implementations are shared across analysis tasks and must be `Send + Sync`.
#[async_trait]
pub trait QueryValidationProvider: Send + Sync {
    /// Whether a first validation of a source location should be delayed.
    ///
    /// Remote or expensive providers enable this to debounce bursts of edits.
    fn enable_throttling(&self) -> bool;

    /// Validate `sql` and describe its shape.
    ///
    /// `want_parameter_info` asks for the parameter list as well as the columns.
    /// Passing empty SQL is a caller bug; implementations panic on it.
    async fn validate(
        &self,
        sql: &str,
        want_parameter_info: bool,
        cancel: &CancellationToken,
    ) -> Result<Outcome<ValidatedQuery>, AnalysisError>;

    /// Provider name for debugging/logging
    fn provider_name(&self) -> &'static str;
}
