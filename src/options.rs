//! Per-invocation upsert options. Defaults, serde and environment loading.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const TIMEOUT_ENV: &str = "BULK_UPSERT_TIMEOUT_SECS";
pub const OPEN_CONNECTION_ENV: &str = "BULK_UPSERT_OPEN_CONNECTION";
pub const CLOSE_CONNECTION_ENV: &str = "BULK_UPSERT_CLOSE_CONNECTION";

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpsertOptions {
    /// Budget for each round trip. `0` means no limit.
    pub timeout_seconds: u64,
    /// Open the session before the first statement.
    pub open_connection: bool,
    /// Close the session on every exit path.
    pub close_connection: bool,
}

impl Default for UpsertOptions {
    fn default() -> Self {
        UpsertOptions {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            open_connection: true,
            close_connection: true,
        }
    }
}

impl UpsertOptions {
    /// Defaults overridden by `BULK_UPSERT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut options = Self::default();
        if let Some(v) = env_var(TIMEOUT_ENV)? {
            options.timeout_seconds = v;
        }
        if let Some(v) = env_var(OPEN_CONNECTION_ENV)? {
            options.open_connection = v;
        }
        if let Some(v) = env_var(CLOSE_CONNECTION_ENV)? {
            options.close_connection = v;
        }
        Ok(options)
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_open_connection(mut self, open: bool) -> Self {
        self.open_connection = open;
        self
    }

    pub fn with_close_connection(mut self, close: bool) -> Self {
        self.close_connection = close;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

fn env_var<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::Load(format!("{}={:?}: {}", name, raw, e))),
        Err(_) => Ok(None),
    }
}
