use std::{env, fmt::Display};

use super::maintenance::MaintenanceConfig;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub redis_url: String,
    pub token_ttl_secs: usize,
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "Environment variable '{}' not set", key),
            ConfigError::Invalid(key, value) => {
                write!(f, "Environment variable '{}' has invalid value '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Reads the configuration from the process environment.
    /// Call `dotenv()` beforehand to pick up a `.env` file.
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT", raw))?,
            None => 8080,
        };
        let token_ttl_secs = match lookup("TOKEN_TTL_SECS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(ttl) if ttl > 0 => ttl,
                _ => return Err(ConfigError::Invalid("TOKEN_TTL_SECS", raw)),
            },
            None => 3600,
        };

        let enabled = match lookup("MAINTENANCE_MODE") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::Invalid("MAINTENANCE_MODE", raw))?,
            None => false,
        };
        let admin_key = lookup("MAINTENANCE_ADMIN_KEY").filter(|key| !key.is_empty());
        if enabled && admin_key.is_none() {
            return Err(ConfigError::Missing("MAINTENANCE_ADMIN_KEY"));
        }

        Ok(Config {
            host: lookup("HOST").unwrap_or_else(|| String::from("127.0.0.1")),
            port,
            database_url,
            redis_url: lookup("REDIS_URL").unwrap_or_else(|| String::from("redis://127.0.0.1/")),
            token_ttl_secs,
            maintenance: MaintenanceConfig { enabled, admin_key },
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}
