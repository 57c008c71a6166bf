//! Runtime configuration read from the environment.

use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DATA_FILE_ENV: &str = "ZENTASK_DATA_FILE";
pub const TICK_MS_ENV: &str = "ZENTASK_TICK_MS";
pub const DATA_FILE_NAME: &str = "zentask_data.json";
pub const DEFAULT_TICK_MS: u64 = 1000;
pub const DEFAULT_LOG_FILTER: &str = "zentask=info";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ZENTASK_TICK_MS must be a positive number of milliseconds, got {0:?}")]
    InvalidTickInterval(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where the state document lives.
    pub data_file: PathBuf,
    /// Period of the timer signal.
    pub tick_interval: Duration,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_file = lookup(DATA_FILE_ENV)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_file);

        let tick_ms = match lookup(TICK_MS_ENV) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => return Err(ConfigError::InvalidTickInterval(raw)),
            },
            None => DEFAULT_TICK_MS,
        };

        Ok(Self {
            data_file,
            tick_interval: Duration::from_millis(tick_ms),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        })
    }
}

fn default_data_file() -> PathBuf {
    ProjectDirs::from("com", "zentask", "ZenTask")
        .map(|dirs| dirs.data_dir().join(DATA_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DATA_FILE_NAME))
}
