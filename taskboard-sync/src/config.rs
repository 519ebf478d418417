//! Layered configuration
//!
//! Sources are merged in precedence order (later sources override earlier ones):
//! 1. Default values
//! 2. The config file: an explicit path, or `taskboard.toml` in the working directory
//! 3. Environment variables prefixed `TASKBOARD_` (nested keys split on `__`,
//!    e.g. `TASKBOARD_REMOTE__TOKEN`)

use crate::history::DEFAULT_HISTORY_CAPACITY;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "taskboard.toml";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "TASKBOARD_";

/// Errors from loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] figment::Error),

    #[error("invalid configuration value for {key}: {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Settings for the GraphQL remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    /// Bearer token sent with every request
    #[serde(deserialize_with = "lenient_string")]
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// Extra attempts after the first for retryable failures
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each attempt
    pub retry_delay_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/graphql".to_string(),
            token: None,
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 500,
        }
    }
}

/// Top-level settings for a board session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Owner whose tasks are loaded
    #[serde(deserialize_with = "lenient_string")]
    pub owner_id: Option<String>,
    /// Number of undo snapshots kept
    pub history_capacity: usize,
    /// Where the column layout is stored
    pub layout_path: Option<PathBuf>,
    pub remote: RemoteConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            owner_id: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            layout_path: None,
            remote: RemoteConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Load and validate configuration from all sources
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(config_file)?.extract()?;
        config.validate()?;
        debug!(endpoint = %config.remote.endpoint, "configuration loaded");
        Ok(config)
    }

    /// Build the layered figment without extracting it
    pub fn figment(config_file: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        match config_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::invalid(
                        "config",
                        format!("config file not found: {}", path.display()),
                    ));
                }
                figment = merge_file(figment, path);
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    figment = merge_file(figment, path);
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::invalid(
                "history_capacity",
                "must keep at least one snapshot",
            ));
        }
        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "remote.timeout_secs",
                "must be at least one second",
            ));
        }
        let endpoint = self.remote.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "remote.endpoint",
                format!("expected an http(s) URL, got '{endpoint}'"),
            ));
        }
        if self.owner_id.as_deref().is_some_and(|o| o.trim().is_empty()) {
            return Err(ConfigError::invalid("owner_id", "cannot be blank"));
        }
        Ok(())
    }

    /// The configured layout path, or `<config dir>/taskboard/layout.json`
    pub fn layout_path(&self) -> Option<PathBuf> {
        self.layout_path.clone().or_else(default_layout_path)
    }
}

/// Where the layout lives when no path is configured
pub fn default_layout_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("taskboard").join("layout.json"))
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    debug!(path = %path.display(), "loading config file");
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}

/// Ids and tokens may be all digits, which env and TOML sources read as numbers
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Signed(n) => n.to_string(),
        Raw::Unsigned(n) => n.to_string(),
    }))
}
