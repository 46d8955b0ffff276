use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_CONNECTION_STRING, ENV_DATABASE_TYPE, ENV_LOCATION_TTL_MS,
    ENV_THROTTLE_DELAY_MS, ENV_VALIDATION_TTL_MS,
};
use crate::domain::{DatabaseType, parse_database_type};

#[derive(Parser)]
#[command(name = "sqlscope")]
#[command(version, about = "Validate embedded SQL call sites against a database", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Call-site manifest to check (same as `sqlscope check <MANIFEST>`)
    pub manifest: Option<PathBuf>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Connection string used when neither the call site nor the manifest names one
    #[arg(long, global = true, env = ENV_CONNECTION_STRING)]
    pub connection_string: Option<String>,

    /// Database type of the fallback connection (sqlserver, postgres, sqlite)
    #[arg(long, global = true, env = ENV_DATABASE_TYPE, value_parser = parse_database_type)]
    pub database_type: Option<DatabaseType>,

    /// Delay before the first validation of a location, for providers that throttle
    #[arg(long, global = true, env = ENV_THROTTLE_DELAY_MS)]
    pub throttle_delay_ms: Option<u64>,

    /// Sliding TTL of cached validation results
    #[arg(long, global = true, env = ENV_VALIDATION_TTL_MS)]
    pub validation_ttl_ms: Option<u64>,

    /// Sliding TTL of throttled location markers
    #[arg(long, global = true, env = ENV_LOCATION_TTL_MS)]
    pub location_ttl_ms: Option<u64>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Check every call site listed in a manifest (default command)
    Check {
        /// Path to the call-site manifest (JSON)
        manifest: PathBuf,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub connection_string: Option<String>,
    pub database_type: Option<DatabaseType>,
    pub throttle_delay_ms: Option<u64>,
    pub validation_ttl_ms: Option<u64>,
    pub location_ttl_ms: Option<u64>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        connection_string: cli.connection_string,
        database_type: cli.database_type,
        throttle_delay_ms: cli.throttle_delay_ms,
        validation_ttl_ms: cli.validation_ttl_ms,
        location_ttl_ms: cli.location_ttl_ms,
    };
    let command = cli
        .command
        .or_else(|| cli.manifest.map(|manifest| Commands::Check { manifest }));
    (config, command)
}
