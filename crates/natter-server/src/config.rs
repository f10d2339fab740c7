//! Process configuration, read from environment variables.

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Where chat records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

/// Who may read a private conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryVisibility {
    /// A valid bearer token is required and the caller must be one of the
    /// two participants.
    Participants,
    /// Anyone who knows both user IDs may read the conversation.
    Public,
}

impl FromStr for HistoryVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "participants" => Ok(HistoryVisibility::Participants),
            "public" => Ok(HistoryVisibility::Public),
            other => Err(format!("unknown visibility: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub history_visibility: HistoryVisibility,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = parse_or(&lookup, "STORAGE", StorageBackend::Postgres)?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let token_ttl_secs: i64 = parse_or(&lookup, "TOKEN_TTL_SECS", 86_400)?;
        if token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_SECS",
                value: token_ttl_secs.to_string(),
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            listen_addr: parse_or(&lookup, "LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            storage,
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 20)?,
            jwt_secret,
            token_ttl_secs,
            history_visibility: parse_or(
                &lookup,
                "PRIVATE_HISTORY_VISIBILITY",
                HistoryVisibility::Participants,
            )?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => match value.parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            }),
        },
    }
}
