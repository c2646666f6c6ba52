//! Centralized configuration (environment variables + defaults).
//!
//! `.env` is loaded first (if present), then the process environment is read.
//! Parsing goes through a lookup function so tests never touch the real
//! environment.

use crate::domain::{is_valid_identifier, ClearPolicy, SchemaError, TableSchema};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Connection string and pool sizing.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("idle_timeout", &self.idle_timeout)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_key: String,
    pub default_table: String,
    pub listen_addr: SocketAddr,
    pub schema: TableSchema,
    pub clear_policy: ClearPolicy,
    pub lock_table: bool,
    pub max_body_bytes: usize,
    /// `None` allows any origin.
    pub cors_allow_origin: Option<String>,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database", &self.database)
            .field("api_key", &"<redacted>")
            .field("default_table", &self.default_table)
            .field("listen_addr", &self.listen_addr)
            .field("columns", &self.schema.columns().len())
            .field("chunk_size", &self.schema.chunk_size())
            .field("clear_policy", &self.clear_policy)
            .field("lock_table", &self.lock_table)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("cors_allow_origin", &self.cors_allow_origin)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let database = DatabaseConfig {
            url,
            max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 20u32)?,
            idle_timeout: Duration::from_secs(parse_or(&get, "DB_IDLE_TIMEOUT_SECS", 30u64)?),
            acquire_timeout: Duration::from_millis(parse_or(
                &get,
                "DB_ACQUIRE_TIMEOUT_MS",
                2_000u64,
            )?),
        };
        if database.max_connections == 0 {
            return Err(invalid("DB_MAX_CONNECTIONS", "must be at least 1"));
        }

        let api_key = get("SYNC_API_KEY")
            .or_else(|| get("API_KEY"))
            .ok_or(ConfigError::Missing("SYNC_API_KEY"))?;

        let default_table = get("SYNC_DEFAULT_TABLE")
            .or_else(|| get("TABLE_NAME"))
            .unwrap_or_else(|| "clients".to_string());
        if !is_valid_identifier(&default_table) {
            return Err(invalid(
                "SYNC_DEFAULT_TABLE",
                "only ASCII letters, digits and underscores are allowed",
            ));
        }

        let host: IpAddr = parse_or(&get, "HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port: u16 = parse_or(&get, "PORT", 3000u16)?;

        let mut schema = match get("SYNC_SCHEMA_FILE") {
            Some(path) => TableSchema::from_json_file(&PathBuf::from(path))?,
            None => TableSchema::preset(&get("SYNC_SCHEMA").unwrap_or_else(|| "wide".into()))?,
        };
        if let Some(raw) = get("SYNC_CHUNK_SIZE") {
            let chunk: usize = raw
                .trim()
                .parse()
                .map_err(|e| invalid("SYNC_CHUNK_SIZE", e))?;
            schema = schema.with_chunk_size(chunk)?;
        }

        let clear_policy = match get("SYNC_CLEAR_MODE") {
            Some(raw) => raw.parse().map_err(|e| invalid("SYNC_CLEAR_MODE", e))?,
            None => ClearPolicy::default(),
        };

        let lock_table = match get("SYNC_TABLE_LOCK") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| invalid("SYNC_TABLE_LOCK", "expected true or false"))?,
            None => true,
        };

        let cors_allow_origin = get("CORS_ALLOW_ORIGIN").filter(|o| o.trim() != "*");

        let log_format = match get("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("pretty") | Some("text") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(invalid("LOG_FORMAT", format!("unknown format '{}'", other)));
            }
        };

        Ok(Self {
            database,
            api_key,
            default_table,
            listen_addr: SocketAddr::new(host, port),
            schema,
            clear_policy,
            lock_table,
            max_body_bytes: parse_or(&get, "SYNC_MAX_BODY_BYTES", 50 * 1024 * 1024usize)?,
            cors_allow_origin,
            log_format,
        })
    }
}

fn invalid(var: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| invalid(var, e)),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
