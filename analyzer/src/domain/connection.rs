//! Connection identity used to pick and cache validation providers

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

/// Database flavour behind a connection string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[default]
    Undefined,
    SqlServer,
    Postgres,
    Sqlite,
}

impl DatabaseType {
    /// Number of variants (size of per-type tables)
    pub const COUNT: usize = 4;

    /// Dense index into per-type tables
    pub fn index(&self) -> usize {
        match self {
            Self::Undefined => 0,
            Self::SqlServer => 1,
            Self::Postgres => 2,
            Self::Sqlite => 3,
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::SqlServer => write!(f, "sqlserver"),
            Self::Postgres => write!(f, "postgres"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Parse a database type from CLI/env/config strings
pub fn parse_database_type(s: &str) -> Result<DatabaseType, String> {
    match s.to_lowercase().as_str() {
        "sqlserver" | "mssql" => Ok(DatabaseType::SqlServer),
        "postgres" | "postgresql" => Ok(DatabaseType::Postgres),
        "sqlite" => Ok(DatabaseType::Sqlite),
        _ => Err(format!(
            "Invalid database type '{}'. Valid options: sqlserver, postgres, sqlite",
            s
        )),
    }
}

/// Connection string plus database type.
///
/// Two values are equal iff both fields are equal. [`ConnectionStringData::undefined`]
/// stands for "no connection hint found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ConnectionStringData {
    pub connection_string: String,
    pub database_type: DatabaseType,
}

impl ConnectionStringData {
    pub fn new(connection_string: impl Into<String>, database_type: DatabaseType) -> Self {
        Self {
            connection_string: connection_string.into(),
            database_type,
        }
    }

    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn is_defined(&self) -> bool {
        !self.connection_string.is_empty() && self.database_type != DatabaseType::Undefined
    }

    /// Stable-per-process hash used in cache keys
    pub fn hash_code(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_sentinel() {
        assert!(!ConnectionStringData::undefined().is_defined());
        assert!(!ConnectionStringData::new("", DatabaseType::Sqlite).is_defined());
        assert!(!ConnectionStringData::new("x", DatabaseType::Undefined).is_defined());
        assert!(ConnectionStringData::new("sqlite://a.db", DatabaseType::Sqlite).is_defined());
    }

    #[test]
    fn test_equality_and_hash() {
        let a = ConnectionStringData::new("sqlite://a.db", DatabaseType::Sqlite);
        let b = ConnectionStringData::new("sqlite://a.db", DatabaseType::Sqlite);
        let c = ConnectionStringData::new("sqlite://a.db", DatabaseType::Postgres);
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());
        assert_ne!(a, c);
    }

    #[test]
    fn test_database_type_serde() {
        let ty: DatabaseType = serde_json::from_str(r#""sqlite""#).unwrap();
        assert_eq!(ty, DatabaseType::Sqlite);
        assert_eq!(DatabaseType::SqlServer.to_string(), "sqlserver");
    }

    #[test]
    fn test_parse_database_type() {
        assert_eq!(parse_database_type("PostgreSQL"), Ok(DatabaseType::Postgres));
        assert_eq!(parse_database_type("mssql"), Ok(DatabaseType::SqlServer));
        assert!(parse_database_type("oracle").is_err());
    }

    #[test]
    fn test_indexes_are_dense() {
        let all = [
            DatabaseType::Undefined,
            DatabaseType::SqlServer,
            DatabaseType::Postgres,
            DatabaseType::Sqlite,
        ];
        for (i, ty) in all.iter().enumerate() {
            assert_eq!(ty.index(), i);
        }
        assert_eq!(all.len(), DatabaseType::COUNT);
    }
}
