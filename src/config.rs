//! Configuration for the sync layer and the HTTP client.
//!
//! Every field has a default, so an empty TOML file (or none at all) yields a working
//! setup pointed at a local API. Environment variables override the file:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LEDGER_API_URL` | `api.base_url` |
//! | `LEDGER_TOKEN_FILE` | `api.token_file` |
//! | `LEDGER_PAGE_SIZE` | `sync.page_size` |

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:5002/api";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {name}: {value}")]
    Env { name: &'static str, value: String },
}

/// Tuning for every [`ResourceSync`](crate::framework::ResourceSync) instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub page_size: u32,
    /// Quiescence window before a search term is committed.
    #[serde(with = "millis")]
    pub debounce: Duration,
    /// Lifetime of success and error notices.
    #[serde(with = "millis")]
    pub notice_ttl: Duration,
    /// Capacity of the command channel.
    pub buffer_size: usize,
    pub fetch_on_mount: bool,
    /// Issue a background refresh once an optimistic delete is confirmed.
    pub refresh_after_delete: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            debounce: Duration::from_millis(500),
            notice_ttl: Duration::from_millis(3000),
            buffer_size: 32,
            fetch_on_mount: true,
            refresh_after_delete: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Where the session token is persisted between runs.
    pub token_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            token_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub sync: SyncConfig,
}

impl AppConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `LEDGER_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars(
        mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup("LEDGER_API_URL") {
            self.api.base_url = url;
        }
        if let Some(path) = lookup("LEDGER_TOKEN_FILE") {
            self.api.token_file = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup("LEDGER_PAGE_SIZE") {
            self.sync.page_size = match value.parse::<u32>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::Env {
                        name: "LEDGER_PAGE_SIZE",
                        value,
                    })
                }
            };
        }
        Ok(self)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
