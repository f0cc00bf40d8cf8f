//! Configuration management for FamilyHub
//!
//! This crate handles loading and validating `.familyhub/config.toml`

use hub_common::{HubError, Result, HUB_DIR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `[remote] url`
pub const ENV_REMOTE_URL: &str = "FAMILYHUB_REMOTE_URL";
/// Environment variable overriding `[remote] api_key`
pub const ENV_REMOTE_KEY: &str = "FAMILYHUB_REMOTE_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project root path (set programmatically, not in TOML)
    #[serde(skip)]
    pub root: PathBuf,

    /// Local cache settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Remote backend settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Collection name -> remote table overrides.
    /// An empty table name keeps that collection local-only.
    #[serde(default)]
    pub tables: BTreeMap<String, String>,

    /// Collection name -> fields never sent to the remote table
    #[serde(default = "default_sanitize")]
    pub sanitize: BTreeMap<String, Vec<String>>,
}

/// Storage configuration ([storage])
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the per-collection JSON files, relative to the root
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(HUB_DIR).join("data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Remote configuration ([remote])
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the backend, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: String,

    /// Anonymous API key sent as `apikey` and bearer token
    #[serde(default)]
    pub api_key: String,

    /// Value of the `x-client-info` header sent with every request
    #[serde(default = "default_client_header")]
    pub client_header: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Issue a reachability request while deciding the backend mode
    #[serde(default)]
    pub probe_on_start: bool,
}

fn default_client_header() -> String {
    "familyhub".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            client_header: default_client_header(),
            timeout_secs: default_timeout_secs(),
            probe_on_start: false,
        }
    }
}

impl RemoteConfig {
    /// True when both URL and key are set
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.api_key.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.is_configured() {
            return Err(HubError::ConfigError(
                "remote url and api_key must both be set".to_string(),
            ));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(HubError::ConfigError(
                "remote url must start with http:// or https://".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(HubError::ConfigError(
                "remote timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_sanitize() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([("news".to_string(), vec!["readBy".to_string()])])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            storage: StorageConfig::default(),
            remote: RemoteConfig::default(),
            tables: BTreeMap::new(),
            sanitize: default_sanitize(),
        }
    }
}

/// Template written by `hub init`
pub const DEFAULT_CONFIG_TOML: &str = r#"# FamilyHub Configuration

[storage]
data_dir = ".familyhub/data"

[remote]
# Leave url/api_key empty to run in local-only mode.
# FAMILYHUB_REMOTE_URL / FAMILYHUB_REMOTE_KEY override these.
url = ""
api_key = ""
client_header = "familyhub"
timeout_secs = 10
probe_on_start = false

[tables]
# meal_plan = "meal_plans"

[sanitize]
news = ["readBy"]
"#;

impl Config {
    /// Load configuration from workspace root
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let config_path = Self::path_for(workspace_root);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| HubError::ConfigError(format!("Failed to read config: {}", e)))?;
            Self::from_toml_str(&content)?
        } else {
            Self::default()
        };

        config.root = workspace_root.to_path_buf();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a config document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| HubError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Location of the config file under a workspace root
    pub fn path_for(workspace_root: &Path) -> PathBuf {
        workspace_root.join(HUB_DIR).join("config.toml")
    }

    /// Replace remote credentials with values from the environment
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_REMOTE_URL).filter(|v| !v.is_empty()) {
            self.remote.url = url;
        }
        if let Some(key) = lookup(ENV_REMOTE_KEY).filter(|v| !v.is_empty()) {
            self.remote.api_key = key;
        }
    }

    /// Absolute directory of the local cache files
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_absolute() {
            self.storage.data_dir.clone()
        } else {
            self.root.join(&self.storage.data_dir)
        }
    }
}
