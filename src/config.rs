//! Connection settings, read from the environment (and a `.env` file when
//! one is present).
//!
//! Every repository family may live in its own database. A section-specific
//! url such as `COMPUCIE_POLL_DB_URL` takes precedence over the shared
//! `COMPUCIE_DB_URL`.

use std::{env, fmt, str::FromStr, time::Duration};

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::db::SqlExecutor;
use crate::error::DbError;

pub const DB_URL_KEY: &str = "COMPUCIE_DB_URL";
pub const MAX_CONNECTIONS_KEY: &str = "COMPUCIE_DB_MAX_CONNECTIONS";
pub const CONNECT_TIMEOUT_KEY: &str = "COMPUCIE_DB_CONNECT_TIMEOUT_SECS";
pub const ROUND_TRIP_TIMEOUT_KEY: &str = "COMPUCIE_DB_ROUND_TRIP_TIMEOUT_MS";

const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Section {
    Poll,
    Member,
    Event,
    Sale,
}

impl Section {
    fn url_key(&self) -> String {
        format!("COMPUCIE_{}_DB_URL", self.to_string().to_uppercase())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Section::Poll => "poll",
            Section::Member => "member",
            Section::Event => "event",
            Section::Sale => "sale",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("key {0} not found in environment")]
    Missing(String),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub round_trip_timeout: Option<Duration>,
}

impl DbConfig {
    /// Reads the shared settings.
    pub fn from_env() -> Result<DbConfig, ConfigError> {
        load_dotenv();
        DbConfig::from_lookup(None, |key| env::var(key).ok())
    }

    /// Reads the settings for one repository family.
    pub fn from_env_section(section: Section) -> Result<DbConfig, ConfigError> {
        load_dotenv();
        DbConfig::from_lookup(Some(section), |key| env::var(key).ok())
    }

    fn from_lookup(section: Option<Section>, lookup: impl Fn(&str) -> Option<String>)
    -> Result<DbConfig, ConfigError> {
        let url = section
            .and_then(|s| lookup(&s.url_key()))
            .or_else(|| lookup(DB_URL_KEY))
            .ok_or_else(|| ConfigError::Missing(match section {
                Some(s) => format!("{} or {}", s.url_key(), DB_URL_KEY),
                None => DB_URL_KEY.to_owned(),
            }))?;

        let max_connections = parse(&lookup, MAX_CONNECTIONS_KEY)?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let connect_timeout = parse(&lookup, CONNECT_TIMEOUT_KEY)?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let round_trip_timeout = parse(&lookup, ROUND_TRIP_TIMEOUT_KEY)?
            .map(Duration::from_millis);

        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: MAX_CONNECTIONS_KEY.to_owned(),
                value: "0".to_owned(),
            });
        }

        Ok(DbConfig { url, max_connections, connect_timeout, round_trip_timeout })
    }

    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .min_connections(1)
            .max_connections(self.max_connections)
            .acquire_timeout(self.connect_timeout)
            .test_before_acquire(true)
    }

    /// Opens the pool and checks that a connection can be made.
    pub async fn connect(&self) -> Result<SqlExecutor, DbError> {
        let pool = self.pool_options()
            .connect(&self.url)
            .await?;
        info!("connected to database with max_connections={}", self.max_connections);

        let executor = SqlExecutor::new(pool);
        Ok(match self.round_trip_timeout {
            Some(timeout) => executor.with_round_trip_timeout(timeout),
            None => executor,
        })
    }
}

fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        debug!("loaded environment from {}", path.display());
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value.trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key: key.to_owned(), value }),
    }
}
