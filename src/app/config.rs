use std::{env, fmt::Display, str::FromStr};

use actix_web::http::Uri;
use log::{info, warn};
use rand::distributions::{Alphanumeric, DistString};
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "5000";
const DEFAULT_POOL_SIZE: &str = "10";
const DEFAULT_TOKEN_HOURS: &str = "720";
const DEFAULT_ADMIN_NAME: &str = "Admin";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("{0} must be set when DATABASE_URL is set")]
    Missing(&'static str),
}

/// Credentials of the admin account created at startup when absent.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Server settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Without it the server keeps everything in memory.
    pub database_url: Option<String>,
    pub pool_size: u32,
    pub jwt_secret: String,
    pub jwt_expires_in_hours: i64,
    pub admin: Option<AdminSeed>,
    /// Origins allowed by CORS; empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `load` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = var("DATABASE_URL");
        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if database_url.is_some() => return Err(ConfigError::Missing("JWT_SECRET")),
            None => {
                warn!("JWT_SECRET not set, tokens will not survive a restart");
                Alphanumeric.sample_string(&mut rand::thread_rng(), 64)
            }
        };

        let pool_size: u32 = try_load(&var, "DATABASE_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        if pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "DATABASE_POOL_SIZE",
                reason: String::from("must be at least 1"),
            });
        }

        let jwt_expires_in_hours: i64 =
            try_load(&var, "JWT_EXPIRES_IN_HOURS", DEFAULT_TOKEN_HOURS)?;
        if jwt_expires_in_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRES_IN_HOURS",
                reason: String::from("must be positive"),
            });
        }

        let admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: var("ADMIN_NAME").unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
                email,
                password,
            }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("ADMIN_EMAIL and ADMIN_PASSWORD must both be set, skipping admin seed");
                None
            }
            (None, None) => None,
        };

        let cors_origins = match var("CORS_ORIGINS") {
            Some(origins) => parse_origins(&origins)?,
            None => {
                info!("CORS_ORIGINS not set, allowing any origin");
                Vec::new()
            }
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: try_load(&var, "PORT", DEFAULT_PORT)?,
            database_url,
            pool_size,
            jwt_secret,
            jwt_expires_in_hours,
            admin,
            cors_origins,
        })
    }
}

/// Splits a comma separated origin list, e.g. `http://localhost:5173,https://blog.dev`.
fn parse_origins(origins: &str) -> Result<Vec<String>, ConfigError> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| match origin.parse::<Uri>() {
            Ok(uri) if uri.scheme().is_some() && uri.host().is_some() => Ok(origin.to_string()),
            _ => Err(ConfigError::Invalid {
                key: "CORS_ORIGINS",
                reason: format!("{origin} is not an origin"),
            }),
        })
        .collect()
}

fn try_load<T, F>(var: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
}
