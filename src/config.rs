//! Process configuration, read once at startup.
//!
//! Values come from the environment (a `.env` file is loaded by `main` through
//! `dotenv`). The resulting [`Config`] is immutable and handed to the components
//! that need it; nothing reads the environment after startup.

use std::env;
use std::str::FromStr;

use chrono::Duration;
use jsonwebtoken::Algorithm;
use thiserror::Error;

pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;
pub const DEFAULT_REFRESH_TOKEN_EXPIRE_MINUTES: i64 = 60 * 24 * 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings shared by the token codec and the password hasher.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Symmetric secret used to sign and verify every token.
    pub secret_key: String,
    /// HMAC algorithm used for signing. Only HS256/HS384/HS512 are accepted.
    pub algorithm: Algorithm,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// bcrypt cost factor.
    pub bcrypt_cost: u32,
}

impl AuthSettings {
    /// Settings with the given secret and default algorithm, lifetimes and cost.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            algorithm: Algorithm::HS256,
            access_token_ttl: Duration::minutes(DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES),
            refresh_token_ttl: Duration::minutes(DEFAULT_REFRESH_TOKEN_EXPIRE_MINUTES),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

pub struct Config {
    pub app_title: String,
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub auth: AuthSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("AUTH_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing("AUTH_KEY"))?;

        let algorithm = match lookup("AUTH_ALGORITHM") {
            Some(name) => parse_algorithm(&name)?,
            None => Algorithm::HS256,
        };

        let access_minutes = parse_or(
            &lookup,
            "AUTH_ACCESS_TOKEN_EXPIRE_MINUTES",
            DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
        )?;
        let refresh_minutes = parse_or(
            &lookup,
            "AUTH_REFRESH_TOKEN_EXPIRE_MINUTES",
            DEFAULT_REFRESH_TOKEN_EXPIRE_MINUTES,
        )?;
        let bcrypt_cost: u32 = parse_or(&lookup, "AUTH_BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "AUTH_BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: "must be between 4 and 31".into(),
            });
        }

        let database_url = lookup("DB_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .ok_or(ConfigError::Missing("DB_URL"))?;

        Ok(Self {
            app_title: lookup("APP_TITLE").unwrap_or_else(|| "task_manager".to_string()),
            database_url,
            server_port: parse_or(&lookup, "MAIN_PORT", 8080)?,
            server_host: lookup("MAIN_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            auth: AuthSettings {
                secret_key,
                algorithm,
                access_token_ttl: minutes("AUTH_ACCESS_TOKEN_EXPIRE_MINUTES", access_minutes)?,
                refresh_token_ttl: minutes("AUTH_REFRESH_TOKEN_EXPIRE_MINUTES", refresh_minutes)?,
                bcrypt_cost,
            },
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn minutes(key: &'static str, value: i64) -> Result<Duration, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be a positive number of minutes".into(),
        });
    }
    Duration::try_minutes(value).ok_or_else(|| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: "out of range".into(),
    })
}

fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key: "AUTH_ALGORITHM",
        value: name.to_string(),
        reason: reason.to_string(),
    };
    let algorithm = Algorithm::from_str(name).map_err(|e| invalid(&e.to_string()))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        _ => Err(invalid("only HMAC algorithms can be used with a shared secret")),
    }
}
