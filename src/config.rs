//! Configuration management for the Customer Registry MCP Server.
//!
//! Settings come from environment variables, optionally seeded from a `.env`
//! file. `dotenvy` never writes to stdout, which is reserved for MCP traffic.

use crate::error::{ConfigError, ConfigResult};
use std::env;
use std::str::FromStr;

pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "(default)";

/// Where customer records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Cloud Firestore over its REST API
    #[default]
    Firestore,

    /// Process-local store, lost on exit
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue {
                var: "STORE_BACKEND".to_string(),
                reason: format!("Must be 'firestore' or 'memory', got: {}", other),
            }),
        }
    }
}

/// Configuration for the Customer Registry MCP Server.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StoreBackend,

    /// Firestore REST base URL, without the `projects/...` suffix
    pub firestore_base_url: String,

    pub firestore_project_id: String,

    pub firestore_database: String,

    /// OAuth2 bearer token sent with every Firestore request
    pub firestore_access_token: String,

    /// HTTP request timeout in seconds (default: 10)
    pub request_timeout: u64,

    /// Page size used when a listing does not ask for one (default: 10)
    pub default_page_size: usize,

    /// Largest page a listing may request (default: 100)
    pub max_page_size: usize,

    /// How long dashboard stats stay cached; 0 disables the cache (default: 60)
    pub stats_cache_ttl_seconds: u64,

    /// Tracing filter used when `RUST_LOG` is unset (default: "error")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required when `STORE_BACKEND` is `firestore` (the default):
    /// - `FIRESTORE_PROJECT_ID`
    /// - `FIRESTORE_ACCESS_TOKEN`
    ///
    /// Optional:
    /// - `FIRESTORE_BASE_URL` (default: `https://firestore.googleapis.com/v1`)
    /// - `FIRESTORE_DATABASE` (default: `(default)`)
    /// - `REQUEST_TIMEOUT`, `DEFAULT_PAGE_SIZE`, `MAX_PAGE_SIZE`,
    ///   `STATS_CACHE_TTL_SECONDS`, `LOG_LEVEL`
    ///
    /// A `.env` file in the working directory (or a parent) is loaded first
    /// if present; variables already set in the environment win.
    pub fn from_env() -> ConfigResult<Self> {
        Self::check_dotenv(dotenvy::dotenv())?;

        let backend = match env::var("STORE_BACKEND") {
            Ok(val) => val.parse()?,
            Err(_) => StoreBackend::default(),
        };

        let firestore_base_url =
            env::var("FIRESTORE_BASE_URL").unwrap_or_else(|_| DEFAULT_FIRESTORE_URL.to_string());
        if !firestore_base_url.starts_with("http://") && !firestore_base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                var: "FIRESTORE_BASE_URL".to_string(),
                reason: "Must start with http:// or https://".to_string(),
            });
        }

        let firestore_database =
            env::var("FIRESTORE_DATABASE").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());

        let (firestore_project_id, firestore_access_token) = match backend {
            StoreBackend::Firestore => (
                Self::required_var("FIRESTORE_PROJECT_ID")?,
                Self::required_var("FIRESTORE_ACCESS_TOKEN")?,
            ),
            StoreBackend::Memory => (
                env::var("FIRESTORE_PROJECT_ID").unwrap_or_default(),
                env::var("FIRESTORE_ACCESS_TOKEN").unwrap_or_default(),
            ),
        };

        let request_timeout = Self::parse_env_u64("REQUEST_TIMEOUT", 10)?;
        let default_page_size = Self::parse_env_usize("DEFAULT_PAGE_SIZE", 10)?;
        let max_page_size = Self::parse_env_usize("MAX_PAGE_SIZE", 100)?;
        let stats_cache_ttl_seconds = Self::parse_env_u64("STATS_CACHE_TTL_SECONDS", 60)?;

        if default_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                var: "DEFAULT_PAGE_SIZE".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }
        if max_page_size < default_page_size {
            return Err(ConfigError::InvalidValue {
                var: "MAX_PAGE_SIZE".to_string(),
                reason: format!("Must be at least DEFAULT_PAGE_SIZE ({})", default_page_size),
            });
        }

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "error".to_string());

        Ok(Config {
            backend,
            firestore_base_url,
            firestore_project_id,
            firestore_database,
            firestore_access_token,
            request_timeout,
            default_page_size,
            max_page_size,
            stats_cache_ttl_seconds,
            log_level,
        })
    }

    /// Resolve a requested page size against the configured default and limit.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .filter(|size| *size > 0)
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size)
    }

    /// A missing `.env` is fine; an unreadable or malformed one is not.
    fn check_dotenv<T>(result: Result<T, dotenvy::Error>) -> ConfigResult<()> {
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.not_found() => Ok(()),
            Err(e) => Err(ConfigError::DotenvError(e.to_string())),
        }
    }

    fn required_var(var_name: &str) -> ConfigResult<String> {
        let value =
            env::var(var_name).map_err(|_| ConfigError::MissingVar(var_name.to_string()))?;
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: "Cannot be empty".to_string(),
            });
        }
        Ok(value)
    }

    fn parse_env_u64(var_name: &str, default: u64) -> ConfigResult<u64> {
        match env::var(var_name) {
            Ok(val) => val.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    fn parse_env_usize(var_name: &str, default: usize) -> ConfigResult<usize> {
        match env::var(var_name) {
            Ok(val) => val
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidValue {
                    var: var_name.to_string(),
                    reason: format!("Must be a positive number, got: {}", val),
                }),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: StoreBackend::Memory,
            firestore_base_url: DEFAULT_FIRESTORE_URL.to_string(),
            firestore_project_id: String::new(),
            firestore_database: DEFAULT_DATABASE.to_string(),
            firestore_access_token: String::new(),
            request_timeout: 10,
            default_page_size: 10,
            max_page_size: 100,
            stats_cache_ttl_seconds: 60,
            log_level: "error".to_string(),
        }
    }
}
