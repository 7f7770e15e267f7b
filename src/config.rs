//! Configuration Module
//!
//! Typed settings layered from an optional YAML file and `AD_SERVICE__*`
//! environment variables (env wins). Every field has a default.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use config::{Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the YAML file to load.
pub const CONFIG_PATH_ENV: &str = "AD_SERVICE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const ENV_PREFIX: &str = "AD_SERVICE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// == Root ==
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub tracing: TracingConfig,
    pub logger: LoggerConfig,
}

// == HTTP ==
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Whole-request deadline; expiry cancels in-flight store and cache calls
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout_secs: 10,
        }
    }
}

// == Database ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Mysql,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    /// Full DSN; when set it takes precedence over the discrete fields
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Mysql,
            url: None,
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            name: "ads".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

// == Cache ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub addr: String,
    pub password: String,
    pub db: i64,
    /// Lifetime of populated entries
    pub ttl_secs: u64,
    /// Per-command deadline for the Redis backend
    pub op_timeout_ms: u64,
    /// Capacity of the in-process backend
    pub max_entries: usize,
    /// Expired-entry sweep interval of the in-process backend
    pub cleanup_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            addr: "localhost:6379".to_string(),
            password: String::new(),
            db: 0,
            ttl_secs: 600,
            op_timeout_ms: 100,
            max_entries: 10_000,
            cleanup_interval_secs: 60,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

// == Tracing ==
/// OTLP span export. Disabled while `endpoint` is unset or empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Collector gRPC endpoint, e.g. `http://otel-collector:4317`
    pub endpoint: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub version: String,
    /// Fraction of root traces sampled, in `[0, 1]`
    pub sampling_rate: f64,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            service_name: "ad-service".to_string(),
            environment: "development".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            sampling_rate: 1.0,
        }
    }
}

impl TracingConfig {
    /// The collector endpoint when export is enabled.
    pub fn otlp_endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
    }
}

// == Logger ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Default directive, overridable with `RUST_LOG`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl Config {
    /// Loads configuration from the file named by `AD_SERVICE_CONFIG`
    /// (default `config.yaml`, optional) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Loads configuration from `path` (skipped when absent) and the environment.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(File::new(path, FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from YAML text, without consulting the environment.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = config::Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid("http.timeout_secs must be positive".into()));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache.ttl_secs must be positive".into()));
        }
        if self.cache.cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache.cleanup_interval_secs must be positive".into(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.tracing.sampling_rate) {
            return Err(ConfigError::Invalid(
                "tracing.sampling_rate must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }

    /// Socket address the HTTP server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.http.host, self.http.port)
            .parse()
            .map_err(|err| ConfigError::Invalid(format!("http bind address: {err}")))
    }
}
