//! Cache key builder

use crate::domain::{ConnectionStringData, SourceLocation};

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Cache key for a validation outcome.
    ///
    /// The analysis mode is part of the key; a query validated without
    /// parameter info must not answer a request that wants it.
    pub fn validation(
        connection: &ConnectionStringData,
        raw_query: &str,
        analyze_parameter_info: bool,
    ) -> String {
        format!(
            "{}:{}:{}",
            connection.hash_code(),
            raw_query,
            if analyze_parameter_info { 1 } else { 0 }
        )
    }

    /// Cache key for a throttled document location
    pub fn document_location(location: &SourceLocation) -> String {
        format!("{}:{}", location.span_start, location.file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatabaseType;

    #[test]
    fn test_validation_key() {
        let conn = ConnectionStringData::new("sqlite://a.db", DatabaseType::Sqlite);
        let key = CacheKey::validation(&conn, "SELECT 1", true);
        assert_eq!(key, format!("{}:SELECT 1:1", conn.hash_code()));
        assert_ne!(key, CacheKey::validation(&conn, "SELECT 1", false));
    }

    #[test]
    fn test_validation_key_depends_on_connection() {
        let a = ConnectionStringData::new("sqlite://a.db", DatabaseType::Sqlite);
        let b = ConnectionStringData::new("sqlite://b.db", DatabaseType::Sqlite);
        assert_ne!(
            CacheKey::validation(&a, "SELECT 1", false),
            CacheKey::validation(&b, "SELECT 1", false)
        );
    }

    #[test]
    fn test_document_location_key() {
        let location = SourceLocation {
            file_path: "src/repo.cs".to_string(),
            span_start: 420,
            ..Default::default()
        };
        assert_eq!(CacheKey::document_location(&location), "420:src/repo.cs");
    }
}
