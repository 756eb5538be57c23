use crate::persistence::{DutyStore, MemoryStore, StoreError};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const HTTP_ADDR_VAR: &str = "DUTY_ROSTER_HTTP_ADDR";
pub const DB_PATH_VAR: &str = "DUTY_ROSTER_DB";
pub const LOG_FILTER_VAR: &str = "DUTY_ROSTER_LOG";

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: '{value}'")]
    InvalidAddr { var: &'static str, value: String },
    #[error("DUTY_ROSTER_DB is set but this build has no sqlite support")]
    SqliteDisabled,
    #[error("could not open store: {0}")]
    Store(#[from] StoreError),
}

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    /// SQLite database path; `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR
                .parse()
                .expect("default address is a valid socket address"),
            db_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get(HTTP_ADDR_VAR) {
            config.http_addr =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidAddr {
                        var: HTTP_ADDR_VAR,
                        value: value.clone(),
                    })?;
        }
        config.db_path = get(DB_PATH_VAR).map(PathBuf::from);
        if let Some(filter) = get(LOG_FILTER_VAR) {
            config.log_filter = filter;
        }
        Ok(config)
    }

    pub fn open_store(&self) -> Result<Arc<dyn DutyStore>, ConfigError> {
        match &self.db_path {
            Some(path) => open_sqlite(path),
            None => Ok(Arc::new(MemoryStore::new())),
        }
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(path: &Path) -> Result<Arc<dyn DutyStore>, ConfigError> {
    let store = crate::persistence::sqlite::SqliteDutyStore::new(path)?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_path: &Path) -> Result<Arc<dyn DutyStore>, ConfigError> {
    Err(ConfigError::SqliteDisabled)
}
