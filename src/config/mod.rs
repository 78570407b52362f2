use serde::Deserialize;
use std::env;
use std::str::FromStr;

// Top-level configuration, one section per concern
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub booking: BookingConfig,
}

// HTTP server and logging
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

// PostgreSQL record store
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Redis catalog cache
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub catalog_ttl_seconds: u64,
}

// Booking engine knobs
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Allow bookings starting today. When false the earliest start is tomorrow.
    pub allow_same_day: bool,
    /// Upper bound on the length of a single stay, in nights.
    pub max_nights: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn or_default(name: &'static str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = or_default(name, default);
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

impl LogFormat {
    fn from_env_value(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::Invalid {
                name: "LOG_FORMAT",
                value: value.to_string(),
            }),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            app: AppConfig {
                host: or_default("HOST", "0.0.0.0"),
                port: parsed("PORT", "8000")?,
                environment: or_default("ENVIRONMENT", "development"),
                rust_log: or_default("RUST_LOG", "homestay_booking=debug,tower_http=debug"),
                log_format: LogFormat::from_env_value(&or_default("LOG_FORMAT", "pretty"))?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                pool_size: parsed("DB_POOL_SIZE", "20")?,
            },
            redis: RedisConfig {
                url: required("REDIS_URL")?,
                catalog_ttl_seconds: parsed("CATALOG_CACHE_TTL_SECONDS", "300")?,
            },
            booking: BookingConfig {
                allow_same_day: parsed("BOOKING_ALLOW_SAME_DAY", "true")?,
                max_nights: parsed("BOOKING_MAX_NIGHTS", "365")?,
            },
        })
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            allow_same_day: true,
            max_nights: 365,
        }
    }
}
