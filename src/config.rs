//! Configuration
//!
//! Layered: built-in defaults, then an optional YAML file, then environment
//! variables. The binary applies its flags last.

use crate::gateway::PostgrestConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";

const APP_DIR: &str = "daily-wisdom";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("missing setting `{0}` (set it in the config file or environment)")]
    Missing(&'static str),

    #[error("invalid url in `{field}`: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Supabase project URL
    pub supabase_url: Option<String>,
    /// Public anon key
    pub anon_key: Option<String>,
    /// Origin used in share links
    pub share_base_url: String,
    pub page_size: usize,
    pub request_timeout_secs: u64,
    /// Session state database; defaults under the user data directory.
    pub db_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supabase_url: None,
            anon_key: None,
            share_base_url: "https://www.daily-wisdom.com".to_string(),
            page_size: 20,
            request_timeout_secs: 30,
            db_path: None,
        }
    }
}

/// `<config dir>/daily-wisdom/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.yaml"))
}

/// `<data dir>/daily-wisdom/state.db`
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join(APP_DIR).join("state.db")
}

impl Config {
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Read `path` if given (it must exist), else the default file if present,
    /// then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay non-empty values from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(url) = non_empty(ENV_SUPABASE_URL) {
            self.supabase_url = Some(url);
        }
        if let Some(key) = non_empty(ENV_SUPABASE_ANON_KEY) {
            self.anon_key = Some(key);
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(default_db_path)
    }

    pub fn share_base(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.share_base_url).map_err(|source| ConfigError::InvalidUrl {
            field: "share_base_url",
            source,
        })
    }

    /// Connection settings for the remote service.
    pub fn postgrest(&self) -> Result<PostgrestConfig, ConfigError> {
        let raw = self
            .supabase_url
            .as_deref()
            .ok_or(ConfigError::Missing("supabase_url"))?;
        let base_url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
            field: "supabase_url",
            source,
        })?;
        let key = self
            .anon_key
            .as_deref()
            .ok_or(ConfigError::Missing("anon_key"))?;
        Ok(PostgrestConfig::new(base_url, key)
            .with_timeout(Duration::from_secs(self.request_timeout_secs)))
    }
}
