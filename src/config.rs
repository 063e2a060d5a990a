use clap::{Parser, ValueEnum};
use validator::Validate;

use crate::config_validator::ConfigValidator;
use crate::error::Error;
use crate::validation::DEFAULT_BOT_PATTERNS;

/// Where visit records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// In-process map, lost on restart
    Memory,
    /// One JSON file per record under `store_location`
    File,
    /// Redis strings prefixed with `store_location`
    Redis,
}

#[derive(Debug, Clone, Parser, Validate)]
#[command(name = "visit-counter", version, about = "Per-origin monthly visit counter")]
pub struct Config {
    /// Server bind address
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:3000")]
    pub bind_address: String,

    /// Origins allowed to record visits, comma separated, exact match
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',', required = true)]
    #[validate(length(min = 1, message = "at least one allowed origin is required"))]
    pub allowed_origins: Vec<String>,

    /// User-agent patterns treated as automated clients; replaces the built-in list
    #[arg(long, env = "BOT_PATTERNS", value_delimiter = ',')]
    pub bot_patterns: Option<Vec<String>>,

    /// Backing store for visit records
    #[arg(long, env = "STORE_BACKEND", value_enum, default_value = "memory")]
    pub store_backend: StoreBackend,

    /// Directory (file backend) or key prefix (redis backend)
    #[arg(long, env = "STORE_LOCATION", default_value = "visit-counter")]
    #[validate(length(min = 1, message = "store location cannot be empty"))]
    pub store_location: String,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// Log level for this crate
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from command-line flags and environment variables
    pub fn from_env() -> Result<Self, Error> {
        let config = Config::try_parse().map_err(|e| Error::Configuration(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Reject configurations the service cannot start with
    pub fn check(&self) -> Result<(), Error> {
        Validate::validate(self).map_err(|e| Error::Configuration(e.to_string()))?;

        ConfigValidator::validate_bind_address(&self.bind_address)?;
        for origin in &self.allowed_origins {
            ConfigValidator::validate_origin(origin)?;
        }
        if self.store_backend == StoreBackend::Redis {
            ConfigValidator::validate_redis_url(&self.redis_url)?;
        }

        Ok(())
    }

    /// Configured bot patterns, or the built-in list
    pub fn bot_patterns(&self) -> Vec<String> {
        match &self.bot_patterns {
            Some(patterns) => patterns.clone(),
            None => DEFAULT_BOT_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}
