use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_LOCATION_TTL_MS, DEFAULT_THROTTLE_DELAY_MS,
    DEFAULT_VALIDATION_TTL_MS,
};
use crate::domain::{ConnectionStringData, parse_database_type};

// =============================================================================
// File Configuration
// =============================================================================

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AnalysisFileConfig {
    pub throttle_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CacheFileConfig {
    pub validation_ttl_ms: Option<u64>,
    pub location_ttl_ms: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ConnectionFileConfig {
    pub connection_string: Option<String>,
    pub database_type: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub analysis: Option<AnalysisFileConfig>,
    pub cache: Option<CacheFileConfig>,
    pub connection: Option<ConnectionFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(analysis) = other.analysis {
            let current = self.analysis.get_or_insert_with(AnalysisFileConfig::default);
            if analysis.throttle_delay_ms.is_some() {
                tracing::trace!(value = ?analysis.throttle_delay_ms, "Merging analysis.throttle_delay_ms");
                current.throttle_delay_ms = analysis.throttle_delay_ms;
            }
        }

        if let Some(cache) = other.cache {
            let current = self.cache.get_or_insert_with(CacheFileConfig::default);
            if cache.validation_ttl_ms.is_some() {
                tracing::trace!(value = ?cache.validation_ttl_ms, "Merging cache.validation_ttl_ms");
                current.validation_ttl_ms = cache.validation_ttl_ms;
            }
            if cache.location_ttl_ms.is_some() {
                tracing::trace!(value = ?cache.location_ttl_ms, "Merging cache.location_ttl_ms");
                current.location_ttl_ms = cache.location_ttl_ms;
            }
        }

        if let Some(connection) = other.connection {
            let current = self
                .connection
                .get_or_insert_with(ConnectionFileConfig::default);
            if connection.connection_string.is_some() {
                tracing::trace!("Merging connection.connection_string");
                current.connection_string = connection.connection_string;
            }
            if connection.database_type.is_some() {
                tracing::trace!(value = ?connection.database_type, "Merging connection.database_type");
                current.database_type = connection.database_type;
            }
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Delay before the first validation of a location when the provider throttles
    pub throttle_delay: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            throttle_delay: Duration::from_millis(DEFAULT_THROTTLE_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub validation_ttl: Duration,
    pub location_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            validation_ttl: Duration::from_millis(DEFAULT_VALIDATION_TTL_MS),
            location_ttl: Duration::from_millis(DEFAULT_LOCATION_TTL_MS),
        }
    }
}

/// Final merged application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub cache: CacheConfig,
    /// Fallback connection for call sites without a hint
    pub connection: Option<ConnectionStringData>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.sqlscope/sqlscope.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");
        Self::resolve(cli, file_config)
    }

    /// Layer defaults -> file config -> CLI/env overrides
    fn resolve(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let file_analysis = file_config.analysis.unwrap_or_default();
        let file_cache = file_config.cache.unwrap_or_default();
        let file_connection = file_config.connection.unwrap_or_default();

        let analysis = AnalysisConfig {
            throttle_delay: Duration::from_millis(
                cli.throttle_delay_ms
                    .or(file_analysis.throttle_delay_ms)
                    .unwrap_or(DEFAULT_THROTTLE_DELAY_MS),
            ),
        };

        let cache = CacheConfig {
            validation_ttl: Duration::from_millis(
                cli.validation_ttl_ms
                    .or(file_cache.validation_ttl_ms)
                    .unwrap_or(DEFAULT_VALIDATION_TTL_MS),
            ),
            location_ttl: Duration::from_millis(
                cli.location_ttl_ms
                    .or(file_cache.location_ttl_ms)
                    .unwrap_or(DEFAULT_LOCATION_TTL_MS),
            ),
        };

        let database_type = match (cli.database_type, file_connection.database_type) {
            (Some(database_type), _) => Some(database_type),
            (None, Some(name)) => Some(
                parse_database_type(&name)
                    .map_err(anyhow::Error::msg)
                    .context("Invalid connection.database_type in config file")?,
            ),
            (None, None) => None,
        };
        let connection_string = cli
            .connection_string
            .clone()
            .or(file_connection.connection_string);

        let connection = match (connection_string, database_type) {
            (Some(connection_string), Some(database_type)) => {
                let connection = ConnectionStringData::new(connection_string, database_type);
                if !connection.is_defined() {
                    anyhow::bail!("Fallback connection string must not be empty");
                }
                Some(connection)
            }
            (Some(_), None) => anyhow::bail!(
                "A connection string was configured without a database type \
                 (sqlserver, postgres, sqlite)"
            ),
            (None, _) => None,
        };

        tracing::debug!(
            throttle_delay_ms = analysis.throttle_delay.as_millis() as u64,
            has_connection = connection.is_some(),
            "Configuration resolved"
        );

        Ok(Self {
            analysis,
            cache,
            connection,
        })
    }
}

/// Get the profile directory config path (~/.sqlscope/sqlscope.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Expand a leading `~` to the home directory
fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
