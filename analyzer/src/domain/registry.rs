//! Provider and analyzer lookup
//!
//! Providers are created lazily, once per connection, by the factory registered
//! for the connection's database type. Lookups first check a single-slot
//! "last used" snapshot, swapped atomically as a whole, then a concurrent map.
//!
//! A factory runs while its map shard is write-locked, which is what limits it
//! to one call per connection. Factories must be cheap (connect lazily) and
//! must not call back into the registry.
//!
//! Analyzers are tried in registration order; the first that accepts a call
//! site wins.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use arc_swap::ArcSwapOption;

use super::analyzers::{CallSiteAnalyzer, DapperAnalyzer, DefaultAnalyzer};
use super::callsite::CallSite;
use super::connection::{ConnectionStringData, DatabaseType};
use crate::data::providers::{QueryValidationProvider, SqliteValidationProvider};

/// Creates a provider for a connection; `None` when it cannot
pub type ProviderFactory = Arc<
    dyn Fn(&ConnectionStringData) -> Option<Arc<dyn QueryValidationProvider>> + Send + Sync,
>;

struct LastUsed {
    connection: ConnectionStringData,
    provider: Arc<dyn QueryValidationProvider>,
}

pub struct ServiceRegistry {
    factories: [Option<ProviderFactory>; DatabaseType::COUNT],
    analyzers: Vec<Box<dyn CallSiteAnalyzer>>,
    last_used: ArcSwapOption<LastUsed>,
    providers: DashMap<ConnectionStringData, Arc<dyn QueryValidationProvider>>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let analyzers: Vec<_> = self.analyzers.iter().map(|a| a.name()).collect();
        f.debug_struct("ServiceRegistry")
            .field("analyzers", &analyzers)
            .field("providers", &self.providers.len())
            .finish()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            factories: std::array::from_fn(|_| None),
            analyzers: Vec::new(),
            last_used: ArcSwapOption::empty(),
            providers: DashMap::new(),
        }
    }

    /// Registry with the bundled analyzers and providers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register_analyzer(DapperAnalyzer::new())
            .register_analyzer(DefaultAnalyzer::new())
            .register_provider(DatabaseType::Sqlite, |connection| {
                match SqliteValidationProvider::connect_lazy(connection) {
                    Ok(provider) => Some(Arc::new(provider) as Arc<dyn QueryValidationProvider>),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to create SQLite validation provider");
                        None
                    }
                }
            });
        registry
    }

    /// Set the provider factory for a database type, replacing any previous one
    pub fn register_provider<F>(&mut self, database_type: DatabaseType, factory: F) -> &mut Self
    where
        F: Fn(&ConnectionStringData) -> Option<Arc<dyn QueryValidationProvider>>
            + Send
            + Sync
            + 'static,
    {
        self.factories[database_type.index()] = Some(Arc::new(factory));
        self
    }

    /// Append an analyzer; register specific analyzers before fallbacks
    pub fn register_analyzer<A>(&mut self, analyzer: A) -> &mut Self
    where
        A: CallSiteAnalyzer + 'static,
    {
        self.analyzers.push(Box::new(analyzer));
        self
    }

    /// Provider for the connection, created on first use
    pub fn get_query_validation_provider(
        &self,
        connection: &ConnectionStringData,
    ) -> Option<Arc<dyn QueryValidationProvider>> {
        if !connection.is_defined() {
            return None;
        }

        let last = self.last_used.load();
        if let Some(last) = last.as_deref()
            && last.connection == *connection
        {
            return Some(Arc::clone(&last.provider));
        }

        let cached = self.providers.get(connection).map(|p| Arc::clone(p.value()));
        let provider = match cached {
            Some(provider) => provider,
            None => self.create_provider(connection)?,
        };

        self.last_used.store(Some(Arc::new(LastUsed {
            connection: connection.clone(),
            provider: Arc::clone(&provider),
        })));
        Some(provider)
    }

    fn create_provider(
        &self,
        connection: &ConnectionStringData,
    ) -> Option<Arc<dyn QueryValidationProvider>> {
        match self.providers.entry(connection.clone()) {
            Entry::Occupied(occupied) => Some(Arc::clone(occupied.get())),
            Entry::Vacant(vacant) => {
                let factory = self.factories[connection.database_type.index()].as_ref()?;
                let provider = factory(connection)?;
                tracing::debug!(
                    database_type = %connection.database_type,
                    provider = provider.provider_name(),
                    "Created validation provider"
                );
                vacant.insert(Arc::clone(&provider));
                Some(provider)
            }
        }
    }

    /// First registered analyzer accepting the call site
    pub fn get_call_site_analyzer(&self, call_site: &CallSite<'_>) -> Option<&dyn CallSiteAnalyzer> {
        self.analyzers
            .iter()
            .find(|a| a.can_analyze(call_site))
            .map(|a| a.as_ref())
    }
}
