//! SQLite validation provider
//!
//! Prepares the query on a read-only pool and reads back what SQLite reports:
//! output column names, declared types and nullability. SQLite does not type
//! bind parameters, so parameter names are taken from the SQL text (`:name`,
//! `@name`, `$name`, in order of first appearance) and typed `dynamic`.

use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Column, Executor, TypeInfo};
use tokio_util::sync::CancellationToken;

use super::QueryValidationProvider;
use crate::core::constants::{SQLITE_ACQUIRE_TIMEOUT_SECS, SQLITE_MAX_CONNECTIONS};
use crate::data::error::AnalysisError;
use crate::domain::{ConnectionStringData, Outcome, ScalarKind, TypeRef, ValidatedQuery};

pub struct SqliteValidationProvider {
    pool: SqlitePool,
}

impl SqliteValidationProvider {
    /// Create a provider whose pool connects on first use
    pub fn connect_lazy(connection: &ConnectionStringData) -> Result<Self, AnalysisError> {
        if connection.connection_string.trim().is_empty() {
            return Err(AnalysisError::Config(
                "SQLite connection string is empty".to_string(),
            ));
        }
        let options = SqliteConnectOptions::from_str(&connection.connection_string)?
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(SQLITE_MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(SQLITE_ACQUIRE_TIMEOUT_SECS))
            .connect_lazy_with(options);

        tracing::debug!("SqliteValidationProvider created");
        Ok(Self { pool })
    }

    /// Create a provider from an existing pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryValidationProvider for SqliteValidationProvider {
    fn enable_throttling(&self) -> bool {
        false
    }

    async fn validate(
        &self,
        sql: &str,
        want_parameter_info: bool,
        cancel: &CancellationToken,
    ) -> Result<Outcome<ValidatedQuery>, AnalysisError> {
        assert!(!sql.trim().is_empty(), "validate called with empty SQL");

        let described = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
            result = self.pool.describe(sql) => result,
        };

        let described = match described {
            Ok(described) => described,
            Err(sqlx::Error::Database(e)) => {
                tracing::debug!(error = %e, "SQLite rejected query");
                return Ok(Outcome::failure(e.message()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut builder = ValidatedQuery::builder();
        if want_parameter_info {
            for name in parameter_names(sql) {
                builder.add_parameter(name, TypeRef::Dynamic);
            }
        }
        for (i, column) in described.columns().iter().enumerate() {
            let nullable = described.nullable(i).unwrap_or(true);
            builder.add_column(
                column.name(),
                map_sqlite_type(column.type_info().name(), nullable),
            );
        }

        Ok(Outcome::Success(builder.build()))
    }

    fn provider_name(&self) -> &'static str {
        "sqlite"
    }
}

/// Map a SQLite declared type name to the host type model
fn map_sqlite_type(name: &str, nullable: bool) -> TypeRef {
    let kind = match name.to_ascii_uppercase().as_str() {
        "INTEGER" | "INT8" | "BIGINT" => ScalarKind::Long,
        "REAL" => ScalarKind::Double,
        "TEXT" => ScalarKind::String,
        "BLOB" => ScalarKind::Bytes,
        "NUMERIC" => ScalarKind::Decimal,
        "BOOLEAN" => ScalarKind::Bool,
        "DATE" | "DATETIME" => ScalarKind::DateTime,
        "TIME" => ScalarKind::TimeSpan,
        // expressions without affinity
        _ => return TypeRef::Dynamic,
    };
    if nullable {
        TypeRef::nullable(kind)
    } else {
        TypeRef::scalar(kind)
    }
}

/// Named bind parameters in order of first appearance, prefix stripped.
///
/// String literals, quoted identifiers and comments are blanked out first.
fn parameter_names(sql: &str) -> Vec<String> {
    static RE_NON_CODE: OnceLock<Regex> = OnceLock::new();
    static RE_PARAMETER: OnceLock<Regex> = OnceLock::new();

    let re_non_code = RE_NON_CODE.get_or_init(|| {
        Regex::new(r#"'(?:[^']|'')*'|"(?:[^"]|"")*"|`(?:[^`]|``)*`|\[[^\]]*\]|--[^\n]*|/\*(?s:.*?)(?:\*/|$)"#)
            .expect("Invalid regex")
    });
    let re_parameter = RE_PARAMETER
        .get_or_init(|| Regex::new(r"[:@$]([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex"));

    let code = re_non_code.replace_all(sql, " ");
    let mut names: Vec<String> = Vec::new();
    for captures in re_parameter.captures_iter(&code) {
        let name = &captures[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatabaseType;

    async fn orders_db(dir: &tempfile::TempDir) -> ConnectionStringData {
        let path = dir.path().join("orders.db");
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, customer TEXT NOT NULL, total REAL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool.close().await;

        ConnectionStringData::new(format!("sqlite://{}", path.display()), DatabaseType::Sqlite)
    }

    #[test]
    fn test_parameter_names() {
        let names = parameter_names(
            "SELECT * FROM t WHERE a = @a AND b = :b AND c = $c AND d = @a AND e = 'x@y.com'",
        );
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parameter_names_ignore_comments() {
        let names = parameter_names(
            "SELECT id FROM orders -- filter by @id later\nWHERE 1 = 1 /* :legacy */",
        );
        assert!(names.is_empty());

        let names = parameter_names("SELECT id /* multi\nline @skip */ FROM orders WHERE id = @id");
        assert_eq!(names, vec!["id"]);
    }

    #[test]
    fn test_parameter_names_ignore_quoted_identifiers() {
        let names = parameter_names(
            r#"SELECT "a@b", [c:d], `e$f` FROM orders WHERE "x""@y" = @status"#,
        );
        assert_eq!(names, vec!["status"]);
    }

    #[test]
    fn test_parameter_names_unterminated_comment() {
        assert!(parameter_names("SELECT 1 /* @open").is_empty());
    }

    #[test]
    fn test_map_sqlite_type() {
        assert_eq!(map_sqlite_type("INTEGER", false), TypeRef::scalar(ScalarKind::Long));
        assert_eq!(map_sqlite_type("text", true), TypeRef::nullable(ScalarKind::String));
        assert_eq!(map_sqlite_type("NULL", true), TypeRef::Dynamic);
    }

    #[tokio::test]
    async fn test_describe_columns_and_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let connection = orders_db(&dir).await;
        let provider = SqliteValidationProvider::connect_lazy(&connection).unwrap();

        let outcome = provider
            .validate(
                "SELECT id, customer, total FROM orders WHERE customer = @customer",
                true,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        let query = outcome.value();

        let names: Vec<_> = query.output_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "customer", "total"]);
        assert_eq!(query.output_columns()[1].ty.display_name(), "string");
        assert!(query.output_columns()[0].ty.display_name().starts_with("long"));
        assert_eq!(query.parameters().len(), 1);
        assert_eq!(query.parameters()[0].name, "customer");
    }

    #[tokio::test]
    async fn test_parameters_skipped_when_not_wanted() {
        let dir = tempfile::tempdir().unwrap();
        let connection = orders_db(&dir).await;
        let provider = SqliteValidationProvider::connect_lazy(&connection).unwrap();

        let outcome = provider
            .validate(
                "SELECT id FROM orders WHERE id = @id",
                false,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(outcome.value().parameters().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_sql_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let connection = orders_db(&dir).await;
        let provider = SqliteValidationProvider::connect_lazy(&connection).unwrap();

        let outcome = provider
            .validate("SELECT id FROM invoices", false, &CancellationToken::new())
            .await
            .unwrap();
        assert!(!outcome.is_success());
        assert!(outcome.errors()[0].contains("no such table"));
    }

    #[tokio::test]
    async fn test_cancelled_before_validation() {
        let dir = tempfile::tempdir().unwrap();
        let connection = orders_db(&dir).await;
        let provider = SqliteValidationProvider::connect_lazy(&connection).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = provider
            .validate("SELECT id FROM orders", false, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    #[should_panic(expected = "empty SQL")]
    async fn test_empty_sql_panics() {
        let provider = SqliteValidationProvider::from_pool(
            SqlitePoolOptions::new().connect_lazy("sqlite::memory:").unwrap(),
        );
        let _ = provider
            .validate("   ", false, &CancellationToken::new())
            .await;
    }

    #[test]
    fn test_empty_connection_string() {
        let connection = ConnectionStringData::new("  ", DatabaseType::Sqlite);
        let err = SqliteValidationProvider::connect_lazy(&connection).err().unwrap();
        assert!(matches!(err, AnalysisError::Config(_)));
    }
}
