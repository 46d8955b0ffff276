//! Core application

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::data::cache::CachingService;
use crate::domain::{
    AnalysisDriver, CallSite, ConnectionStringData, Diagnostic, DiagnosticCollector, Invocation,
    ServiceRegistry, Severity, StandardConversions,
};

/// Call sites exported by the host, with an optional shared connection
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Manifest {
    #[serde(default)]
    pub connection: Option<ConnectionStringData>,
    pub call_sites: Vec<Invocation>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading manifest");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }
}

pub struct CoreApp {
    pub config: AppConfig,
    pub driver: AnalysisDriver,
}

impl CoreApp {
    /// Run the application with CLI argument parsing; returns the process exit code
    pub async fn run() -> Result<i32> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let Some(Commands::Check { manifest }) = command else {
            anyhow::bail!("No manifest given. Usage: {} check <MANIFEST>", APP_NAME_LOWER);
        };

        let config = AppConfig::load(&cli_config)?;
        let app = Self::new(config);
        app.check(&manifest).await
    }

    pub fn new(config: AppConfig) -> Self {
        let registry = Arc::new(ServiceRegistry::with_defaults());
        let cache = Arc::new(CachingService::new(&config.cache));
        let driver = AnalysisDriver::new(registry, cache, config.analysis.clone());
        Self { config, driver }
    }

    fn init_logging() {
        let default_filter = format!("warn,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    /// Check a manifest and print its diagnostics; exit code 1 when any is an error
    async fn check(&self, path: &Path) -> Result<i32> {
        let manifest = Manifest::load(path)?;

        let cancel = CancellationToken::new();
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, cancelling analysis");
                    cancel.cancel();
                }
            })
        };

        let result = self.analyze_manifest(&manifest, &cancel).await;
        interrupt.abort();
        let diagnostics = result?;

        for diagnostic in &diagnostics {
            println!("{diagnostic}");
        }

        let errors = diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Error)
            .count();
        tracing::info!(
            call_sites = manifest.call_sites.len(),
            diagnostics = diagnostics.len(),
            errors,
            "Check finished"
        );

        Ok(if errors > 0 { 1 } else { 0 })
    }

    /// Analyze every call site concurrently; diagnostics sorted by location
    pub async fn analyze_manifest(
        &self,
        manifest: &Manifest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Diagnostic>> {
        let semantic = StandardConversions;
        let sink = DiagnosticCollector::new();

        let results = join_all(manifest.call_sites.iter().map(|invocation| {
            let connection = self.connection_for(invocation, manifest);
            let sink = &sink;
            let semantic = &semantic;
            async move {
                let call_site = CallSite::new(invocation, semantic);
                self.driver
                    .analyze(&call_site, &connection, cancel, sink)
                    .await
            }
        }))
        .await;

        for result in results {
            result.context("Analysis did not complete")?;
        }

        let mut diagnostics = sink.into_diagnostics();
        diagnostics.sort_by(|a, b| {
            (&a.location.file_path, a.location.line, a.location.column, a.id()).cmp(&(
                &b.location.file_path,
                b.location.line,
                b.location.column,
                b.id(),
            ))
        });
        Ok(diagnostics)
    }

    /// Call-site hint, then manifest connection, then configured fallback
    fn connection_for(&self, invocation: &Invocation, manifest: &Manifest) -> ConnectionStringData {
        invocation
            .connection
            .as_ref()
            .or(manifest.connection.as_ref())
            .or(self.config.connection.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatabaseType, DiagnosticKind, MethodSymbol, ScalarKind, SourceLocation, TypeRef};

    fn invocation(line: u32, sql: &str, return_type: TypeRef) -> Invocation {
        Invocation {
            location: SourceLocation {
                file_path: "src/OrderRepository.cs".to_string(),
                span_start: line as usize * 40,
                span_length: 30,
                line,
                column: 9,
            },
            method: Some(MethodSymbol {
                name: "LoadIds".to_string(),
                containing_type: "Shop.OrderRepository".to_string(),
                return_type,
            }),
            sql: sql.to_string(),
            arguments: Vec::new(),
            connection: None,
        }
    }

    #[test]
    fn test_manifest_parse() {
        let json = r#"{
            "connection": { "connection_string": "sqlite://shop.db", "database_type": "sqlite" },
            "call_sites": [{
                "location": { "file_path": "src/a.cs", "span_start": 3 },
                "sql": "SELECT 1"
            }]
        }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.call_sites.len(), 1);
        assert_eq!(
            manifest.connection.unwrap().database_type,
            DatabaseType::Sqlite
        );
    }

    #[test]
    fn test_connection_precedence() {
        let config = AppConfig {
            connection: Some(ConnectionStringData::new("sqlite://config.db", DatabaseType::Sqlite)),
            ..Default::default()
        };
        let app = CoreApp::new(config);
        let mut inv = invocation(1, "SELECT 1", TypeRef::Dynamic);
        let mut manifest = Manifest::default();

        assert_eq!(app.connection_for(&inv, &manifest).connection_string, "sqlite://config.db");

        manifest.connection = Some(ConnectionStringData::new("sqlite://manifest.db", DatabaseType::Sqlite));
        assert_eq!(app.connection_for(&inv, &manifest).connection_string, "sqlite://manifest.db");

        inv.connection = Some(ConnectionStringData::new("sqlite://site.db", DatabaseType::Sqlite));
        assert_eq!(app.connection_for(&inv, &manifest).connection_string, "sqlite://site.db");
    }

    #[test]
    fn test_no_connection_is_undefined() {
        let app = CoreApp::new(AppConfig::default());
        let inv = invocation(1, "SELECT 1", TypeRef::Dynamic);
        assert!(!app.connection_for(&inv, &Manifest::default()).is_defined());
    }

    #[tokio::test]
    async fn test_analyze_manifest_against_sqlite() {
        use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.db");
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().filename(&path).create_if_missing(true))
            .await
            .unwrap();
        sqlx::query("CREATE TABLE orders (id INTEGER PRIMARY KEY, customer TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let manifest = Manifest {
            connection: Some(ConnectionStringData::new(
                format!("sqlite://{}", path.display()),
                DatabaseType::Sqlite,
            )),
            call_sites: vec![
                invocation(
                    10,
                    "SELECT id FROM orders",
                    TypeRef::sequence_of(TypeRef::nullable(ScalarKind::Long)),
                ),
                invocation(
                    20,
                    "SELECT id FROM invoices",
                    TypeRef::sequence_of(TypeRef::nullable(ScalarKind::Long)),
                ),
                invocation(
                    30,
                    "SELECT id, customer FROM orders",
                    TypeRef::sequence_of(TypeRef::scalar(ScalarKind::Guid)),
                ),
            ],
        };

        let app = CoreApp::new(AppConfig::default());
        let diagnostics = app
            .analyze_manifest(&manifest, &CancellationToken::new())
            .await
            .unwrap();

        let found: Vec<_> = diagnostics.iter().map(|d| (d.location.line, d.kind)).collect();
        assert_eq!(
            found,
            vec![
                (20, DiagnosticKind::SqlValidationFailed),
                (30, DiagnosticKind::ExpectedSingleColumn),
            ]
        );
        assert!(diagnostics[0].message().contains("no such table"));
    }

    #[tokio::test]
    async fn test_analyze_manifest_cancelled() {
        let manifest = Manifest {
            connection: Some(ConnectionStringData::new("sqlite://unused.db", DatabaseType::Sqlite)),
            call_sites: vec![invocation(1, "SELECT 1", TypeRef::Dynamic)],
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let app = CoreApp::new(AppConfig::default());
        assert!(app.analyze_manifest(&manifest, &cancel).await.is_err());
    }
}
