use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::clients::opencorporates::{DEFAULT_API_URL, DEFAULT_API_VERSION};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub register: RegisterConfig,
    #[serde(default)]
    pub traversal: TraversalConfig,
    #[serde(default)]
    pub opencorporates: OpencorporatesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterConfig {
    pub db_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Chain query limits
#[derive(Debug, Clone, Deserialize)]
pub struct TraversalConfig {
    /// Abort a chain query returning more chains than this; 0 disables the limit.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpencorporatesConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpencorporatesConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_version: default_api_version(),
            api_token_env: default_api_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_results() -> usize {
    10_000
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_api_token_env() -> String {
    "OPENCORPORATES_API_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in OWNREG_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("OWNREG_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml(&config_str)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.register.db_path.as_os_str().is_empty() {
            anyhow::bail!("register.db_path must not be empty");
        }

        url::Url::parse(&self.opencorporates.api_url).with_context(|| {
            format!(
                "opencorporates.api_url is not a valid URL: {}",
                self.opencorporates.api_url
            )
        })?;

        if self.opencorporates.timeout_secs == 0 {
            anyhow::bail!("opencorporates.timeout_secs must be greater than 0");
        }

        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.register.db_path
    }

    pub fn opencorporates_timeout(&self) -> Duration {
        Duration::from_secs(self.opencorporates.timeout_secs)
    }

    /// OpenCorporates API token from the configured environment variable
    pub fn opencorporates_token(&self) -> Result<String> {
        std::env::var(&self.opencorporates.api_token_env).with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with your OpenCorporates API token.",
                self.opencorporates.api_token_env
            )
        })
    }
}
