//! Validation result caching
//!
//! Two expiring caches, each behind its own lock:
//! - validation outcomes keyed by connection + query text + analysis mode
//! - "already seen" markers for source locations (throttling)
//!
//! The validation lock is held for the whole check-compute-store sequence, so
//! at most one computation runs at a time per service instance and concurrent
//! callers re-check the cache once it is released. This serializes computations
//! for all keys, not only colliding ones.

mod expiring;
mod key;

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub use expiring::ExpiringCache;
pub use key::CacheKey;

use crate::core::config::CacheConfig;
use crate::data::error::AnalysisError;
use crate::domain::{ConnectionStringData, Outcome, SourceLocation, ValidatedQuery};

/// Outcome of validating one query
pub type ValidationOutcome = Outcome<ValidatedQuery>;

/// Caching service for validation outcomes and throttling markers
pub struct CachingService {
    validation: tokio::sync::Mutex<ExpiringCache<ValidationOutcome>>,
    locations: parking_lot::Mutex<ExpiringCache<()>>,
    validation_ttl: Duration,
    location_ttl: Duration,
}

impl std::fmt::Debug for CachingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingService")
            .field("validation_ttl", &self.validation_ttl)
            .field("location_ttl", &self.location_ttl)
            .finish()
    }
}

impl Default for CachingService {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl CachingService {
    pub fn new(config: &CacheConfig) -> Self {
        tracing::debug!(
            validation_ttl_ms = config.validation_ttl.as_millis() as u64,
            location_ttl_ms = config.location_ttl.as_millis() as u64,
            "Initializing validation cache"
        );
        Self {
            validation: tokio::sync::Mutex::new(ExpiringCache::new()),
            locations: parking_lot::Mutex::new(ExpiringCache::new()),
            validation_ttl: config.validation_ttl,
            location_ttl: config.location_ttl,
        }
    }

    // =========================================================================
    // Validation outcomes
    // =========================================================================

    /// Cached outcome for the query, computing and storing it on a miss.
    ///
    /// Failures are cached like successes. An `Err` from `compute` (including
    /// [`AnalysisError::Cancelled`]) is returned as-is and nothing is stored, and
    /// neither is the empty failure sentinel.
    ///
    /// Waiting for the lock observes `cancel`; a caller cancelled while another
    /// computation holds the lock gets [`AnalysisError::Cancelled`], never a hit.
    pub async fn get_or_add_validation_result<F, Fut>(
        &self,
        connection: &ConnectionStringData,
        raw_query: &str,
        analyze_parameter_info: bool,
        cancel: &CancellationToken,
        compute: F,
    ) -> Result<ValidationOutcome, AnalysisError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ValidationOutcome, AnalysisError>>,
    {
        let key = CacheKey::validation(connection, raw_query, analyze_parameter_info);
        let mut cache = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
            guard = self.validation.lock() => guard,
        };
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        if let Some(cached) = cache.get(&key) {
            tracing::trace!(key = %key, "Validation cache hit");
            return Ok(cached.clone());
        }

        tracing::debug!(key = %key, "Validation cache miss");
        let outcome = compute().await?;
        self.store(&mut cache, key, &outcome);
        Ok(outcome)
    }

    /// Blocking variant of [`get_or_add_validation_result`](Self::get_or_add_validation_result).
    ///
    /// # Panics
    /// Panics when called from within an async execution context.
    pub fn get_or_add_validation_result_blocking<F>(
        &self,
        connection: &ConnectionStringData,
        raw_query: &str,
        analyze_parameter_info: bool,
        compute: F,
    ) -> Result<ValidationOutcome, AnalysisError>
    where
        F: FnOnce() -> Result<ValidationOutcome, AnalysisError>,
    {
        let key = CacheKey::validation(connection, raw_query, analyze_parameter_info);
        let mut cache = self.validation.blocking_lock();

        if let Some(cached) = cache.get(&key) {
            tracing::trace!(key = %key, "Validation cache hit");
            return Ok(cached.clone());
        }

        tracing::debug!(key = %key, "Validation cache miss");
        let outcome = compute()?;
        self.store(&mut cache, key, &outcome);
        Ok(outcome)
    }

    fn store(
        &self,
        cache: &mut ExpiringCache<ValidationOutcome>,
        key: String,
        outcome: &ValidationOutcome,
    ) {
        if outcome.is_empty_failure() {
            tracing::debug!(key = %key, "Empty validation outcome not cached");
            return;
        }
        cache.set(key, outcome.clone(), self.validation_ttl, true);
    }

    // =========================================================================
    // Document locations
    // =========================================================================

    /// Whether the location was already marked; marks it if not
    pub fn contains_or_add_document_location(&self, location: &SourceLocation) -> bool {
        let key = CacheKey::document_location(location);
        let mut cache = self.locations.lock();

        if cache.has(&key) {
            return true;
        }
        cache.set(key, (), self.location_ttl, true);
        false
    }
}
