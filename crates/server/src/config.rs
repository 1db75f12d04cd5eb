//! Runtime configuration read from the environment (and `.env`).

use chrono::FixedOffset;
use models::PenaltyPolicy;
use std::{env, net::SocketAddr, str::FromStr, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Credentials of the admin account created at startup
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// `None` disables the background overdue sweep
    pub sweep_interval: Option<Duration>,
    pub penalty_policy: PenaltyPolicy,
    /// Lab timezone as a fixed offset from UTC
    pub utc_offset: FixedOffset,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine; real deployments set the variables directly
        let _ = dotenvy::dotenv();

        let token_ttl_hours: u64 = parse_or("TOKEN_TTL_HOURS", 24)?;
        let sweep_secs: u64 = parse_or("OVERDUE_SWEEP_INTERVAL_SECS", 300)?;

        let penalty_policy = PenaltyPolicy {
            per_day_rate: parse_or("PENALTY_PER_DAY_RATE", PenaltyPolicy::default().per_day_rate)?,
            ..PenaltyPolicy::default()
        };
        if penalty_policy.per_day_rate <= 0 {
            return Err(ConfigError::Invalid {
                name: "PENALTY_PER_DAY_RATE",
                value: penalty_policy.per_day_rate.to_string(),
            });
        }

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < 16 {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                value: "<too short, use at least 16 bytes>".to_owned(),
            });
        }

        let bootstrap_admin = match (optional("ADMIN_EMAIL"), optional("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ADMIN_EMAIL")),
        };

        let utc_offset = utc_offset(parse_or("LAB_UTC_OFFSET_MINUTES", 0)?)?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_addr: parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret,
            token_ttl: Duration::from_secs(token_ttl_hours * 3600),
            sweep_interval: (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs)),
            penalty_policy,
            utc_offset,
            bootstrap_admin,
        })
    }
}

/// Real-world offsets stay within UTC-12:00 and UTC+14:00
fn utc_offset(minutes: i32) -> Result<FixedOffset, ConfigError> {
    (-12 * 60..=14 * 60)
        .contains(&minutes)
        .then(|| FixedOffset::east_opt(minutes * 60))
        .flatten()
        .ok_or(ConfigError::Invalid {
            name: "LAB_UTC_OFFSET_MINUTES",
            value: minutes.to_string(),
        })
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
