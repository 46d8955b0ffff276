// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "sqlscope";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".sqlscope";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "sqlscope.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "SQLSCOPE_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "SQLSCOPE_LOG";

// =============================================================================
// Environment Variables - Connection
// =============================================================================

/// Environment variable for the connection string used when a call site has no hint
pub const ENV_CONNECTION_STRING: &str = "SQLSCOPE_CONNECTION_STRING";

/// Environment variable for the database type of the fallback connection
pub const ENV_DATABASE_TYPE: &str = "SQLSCOPE_DATABASE_TYPE";

// =============================================================================
// Environment Variables - Analysis
// =============================================================================

/// Environment variable for the provider throttling delay
pub const ENV_THROTTLE_DELAY_MS: &str = "SQLSCOPE_THROTTLE_DELAY_MS";

/// Environment variable for the validation result cache TTL
pub const ENV_VALIDATION_TTL_MS: &str = "SQLSCOPE_VALIDATION_TTL_MS";

/// Environment variable for the document location cache TTL
pub const ENV_LOCATION_TTL_MS: &str = "SQLSCOPE_LOCATION_TTL_MS";

// =============================================================================
// Analysis Defaults
// =============================================================================

/// Delay applied before the first validation of a source location when the
/// provider asks for throttling
pub const DEFAULT_THROTTLE_DELAY_MS: u64 = 750;

/// Sliding TTL for cached validation outcomes
pub const DEFAULT_VALIDATION_TTL_MS: u64 = 10_000;

/// Sliding TTL for "already throttled" document location markers
pub const DEFAULT_LOCATION_TTL_MS: u64 = 2_000;

/// Suffix of synthetic parameters introduced by list-parameter expansion.
///
/// Query parameters ending in this suffix are never reported as missing or unused.
pub const INTRINSIC_PARAMETER_SUFFIX: &str = "__sqlaintr";

// =============================================================================
// Call-Site Conventions
// =============================================================================

/// Containing type of the micro-ORM extension methods
pub const DAPPER_MAPPER_TYPE: &str = "Dapper.SqlMapper";

/// Name of the micro-ORM method parameter carrying the parameters object
pub const DAPPER_PARAM_ARGUMENT: &str = "param";

/// Parameter bag whose members are only known at run time
pub const DAPPER_DYNAMIC_PARAMETERS_TYPE: &str = "Dapper.DynamicParameters";

// =============================================================================
// SQLite Provider
// =============================================================================

/// Maximum pooled connections per SQLite validation provider
pub const SQLITE_MAX_CONNECTIONS: u32 = 2;

/// Seconds to wait for a pooled SQLite connection
pub const SQLITE_ACQUIRE_TIMEOUT_SECS: u64 = 5;
