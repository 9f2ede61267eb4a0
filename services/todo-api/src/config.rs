//! Type-Safe Configuration with Validation
//!
//! Loads the service configuration from environment variables once at startup.
//! The resulting value is passed explicitly to every component that needs it.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Variable the URL came from
        field: String,
        /// Parser message
        reason: String,
    },

    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Invalid timeout value
    #[error("Invalid timeout for {0}: must be greater than 0")]
    InvalidTimeout(String),

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },
}

/// Table backend selected by `STORE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// DynamoDB through the AWS SDK
    #[default]
    DynamoDb,
    /// Process-local table, lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dynamodb" | "dynamo" => Ok(Self::DynamoDb),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Service configuration with validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port (1-65535)
    pub port: u16,
    /// Key-value table holding todo records
    pub table_name: String,
    /// Table backend
    pub store_backend: StoreBackend,
    /// Table endpoint override, for local emulators
    pub dynamodb_endpoint: Option<Url>,
    /// Identity provider region
    pub region: String,
    /// Identity provider user pool
    pub user_pool_id: String,
    /// Client identifier tokens must be issued for (audience)
    pub client_id: String,
    /// JWKS endpoint URL
    pub jwks_url: Url,
    /// JWKS cache TTL in seconds (0 disables caching)
    pub jwks_cache_ttl_seconds: u64,
    /// JWKS fetch timeout in seconds
    pub jwks_timeout_seconds: u64,
    /// Per-call store timeout in seconds
    pub store_timeout_seconds: u64,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let region = required_env("AWS_REGION")?;
        let user_pool_id = required_env("COGNITO_USER_POOL_ID")?;
        let jwks_url = match env::var("JWKS_URL") {
            Ok(url) => parse_url("JWKS_URL", &url)?,
            Err(_) => parse_url("JWKS_URL", &jwks_url_for(&region, &user_pool_id))?,
        };

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 8080)?,
            table_name: required_env("TABLE_NAME")?,
            store_backend: parse_env("STORE_BACKEND", StoreBackend::DynamoDb)?,
            dynamodb_endpoint: match env::var("DYNAMODB_ENDPOINT") {
                Ok(url) => Some(parse_url("DYNAMODB_ENDPOINT", &url)?),
                Err(_) => None,
            },
            client_id: required_env("COGNITO_CLIENT_ID")?,
            region,
            user_pool_id,
            jwks_url,
            jwks_cache_ttl_seconds: parse_env("JWKS_CACHE_TTL", 3600)?,
            jwks_timeout_seconds: parse_env("JWKS_TIMEOUT", 5)?,
            store_timeout_seconds: parse_env("STORE_TIMEOUT", 5)?,
            shutdown_timeout_seconds: parse_env("SHUTDOWN_TIMEOUT", 30)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.jwks_timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout("JWKS_TIMEOUT".to_string()));
        }
        if self.store_timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout("STORE_TIMEOUT".to_string()));
        }
        for (name, value) in [
            ("TABLE_NAME", &self.table_name),
            ("AWS_REGION", &self.region),
            ("COGNITO_USER_POOL_ID", &self.user_pool_id),
            ("COGNITO_CLIENT_ID", &self.client_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingRequired(name.to_string()));
            }
        }
        Ok(())
    }

    /// Socket address string the server binds to.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Gets the JWKS URL as a string.
    #[must_use]
    pub fn jwks_url_str(&self) -> &str {
        self.jwks_url.as_str()
    }

    /// Key set cache TTL, `None` when caching is disabled.
    #[must_use]
    pub fn jwks_cache_ttl(&self) -> Option<Duration> {
        (self.jwks_cache_ttl_seconds > 0).then(|| Duration::from_secs(self.jwks_cache_ttl_seconds))
    }

    /// JWKS HTTP timeout.
    #[must_use]
    pub const fn jwks_timeout(&self) -> Duration {
        Duration::from_secs(self.jwks_timeout_seconds)
    }

    /// Per-call store deadline.
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_seconds)
    }

    /// Graceful shutdown drain period.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

/// Well-known JWKS location of a Cognito user pool.
#[must_use]
pub fn jwks_url_for(region: &str, user_pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}/.well-known/jwks.json")
}

/// Read a variable that has no default.
fn required_env(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingRequired(name.to_string()))
}

/// Parse an environment variable with a default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field: name.to_string(),
        reason: e.to_string(),
    })
}
