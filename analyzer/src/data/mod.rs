//! Data layer
//!
//! - `cache` - expiring caches for validation outcomes and throttling markers
//! - `providers` - database validation providers
//! - `error` - error type shared by providers, cache and driver

pub mod cache;
pub mod error;
pub mod providers;

pub use cache::CachingService;
pub use error::AnalysisError;
pub use providers::{QueryValidationProvider, SqliteValidationProvider};
