//! Per-call-site orchestration
//!
//! registry (provider + analyzer) -> normalize -> throttle -> cached validation
//! -> reconcile -> diagnostics. Infrastructure errors become a single
//! diagnostic; cancellation is the only error returned to the caller.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::callsite::CallSite;
use super::connection::ConnectionStringData;
use super::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use super::outcome::Outcome;
use super::reconcile::Reconciler;
use super::registry::ServiceRegistry;
use crate::core::config::AnalysisConfig;
use crate::data::cache::CachingService;
use crate::data::error::AnalysisError;

pub struct AnalysisDriver {
    registry: Arc<ServiceRegistry>,
    cache: Arc<CachingService>,
    config: AnalysisConfig,
}

impl AnalysisDriver {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        cache: Arc<CachingService>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            config,
        }
    }

    /// Validate one call site against `connection` and report what is wrong with it.
    ///
    /// Returns `Err(AnalysisError::Cancelled)` when `cancel` fires; every other
    /// problem is reported through `sink` or silently skipped.
    pub async fn analyze(
        &self,
        call_site: &CallSite<'_>,
        connection: &ConnectionStringData,
        cancel: &CancellationToken,
        sink: &dyn DiagnosticSink,
    ) -> Result<(), AnalysisError> {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let raw_sql = call_site.sql();
        if raw_sql.trim().is_empty() {
            return Ok(());
        }
        if !connection.is_defined() {
            tracing::trace!(location = %call_site.location(), "No connection for call site");
            return Ok(());
        }

        let Some(provider) = self.registry.get_query_validation_provider(connection) else {
            tracing::debug!(
                database_type = %connection.database_type,
                "No validation provider for connection"
            );
            return Ok(());
        };
        let Some(analyzer) = self.registry.get_call_site_analyzer(call_site) else {
            tracing::debug!(location = %call_site.location(), "No analyzer accepts call site");
            return Ok(());
        };

        let definition = match analyzer.normalize_query_definition(call_site) {
            Outcome::Success(definition) => definition,
            Outcome::Failure(errors) => {
                tracing::debug!(
                    analyzer = analyzer.name(),
                    location = %call_site.location(),
                    errors = ?errors,
                    "Call site normalization failed"
                );
                return Ok(());
            }
        };

        let sql = definition.normalized_sql().unwrap_or(raw_sql);

        if provider.enable_throttling()
            && !self
                .cache
                .contains_or_add_document_location(call_site.location())
        {
            tracing::trace!(
                location = %call_site.location(),
                delay_ms = self.config.throttle_delay.as_millis() as u64,
                "Throttling first validation"
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
                _ = tokio::time::sleep(self.config.throttle_delay) => {}
            }
        }

        let want_parameter_info = definition.check_parameters();
        let result = self
            .cache
            .get_or_add_validation_result(connection, sql, want_parameter_info, cancel, || {
                provider.validate(sql, want_parameter_info, cancel)
            })
            .await;

        let location = call_site.location();
        let query = match result {
            Ok(Outcome::Success(query)) => query,
            Ok(Outcome::Failure(errors)) if errors.is_empty() => {
                tracing::debug!(location = %location, "Validation produced no result");
                return Ok(());
            }
            Ok(Outcome::Failure(errors)) => {
                sink.report(Diagnostic::new(
                    DiagnosticKind::SqlValidationFailed,
                    location,
                    vec![errors.join("\n")],
                ));
                return Ok(());
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                tracing::warn!(
                    provider = provider.provider_name(),
                    location = %location,
                    error = %e,
                    "Query validation failed unexpectedly"
                );
                sink.report(Diagnostic::new(
                    DiagnosticKind::ValidationFailedUnexpectedly,
                    location,
                    vec![e.to_string()],
                ));
                return Ok(());
            }
        };

        for diagnostic in Reconciler::for_call_site(call_site).reconcile(&definition, &query) {
            sink.report(diagnostic);
        }
        Ok(())
    }
}
