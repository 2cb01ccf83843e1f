//! Configuration management for the transaction sender
//!
//! Loads configuration from TOML files with environment variable substitution.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "CFX_SENDER_CONFIG";

/// Gas charged for a plain value transfer
pub const DEFAULT_TRANSFER_GAS: u64 = 21_000;

/// Epoch tag used for epoch and estimation queries
pub const DEFAULT_EPOCH_TAG: &str = "latest_state";

lazy_static! {
    static ref ENV_VAR_PATTERN: Regex =
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static pattern is valid");
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub rpc: RpcConfig,
    #[serde(default)]
    pub sender: SenderConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    /// Endpoints in failover order
    pub urls: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SenderConfig {
    #[serde(default = "default_transfer_gas")]
    pub transfer_gas: u64,
    #[serde(default = "default_epoch_tag")]
    pub epoch_tag: String,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            transfer_gas: DEFAULT_TRANSFER_GAS,
            epoch_tag: DEFAULT_EPOCH_TAG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// Environment variables holding hex private keys to load locally
    #[serde(default)]
    pub private_key_envs: Vec<String>,
    /// Environment variable holding the unlock password
    pub password_env: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl RpcConfig {
    /// Configured URLs, skipping blanks left by unset variables
    pub fn endpoints(&self) -> Vec<&str> {
        self.urls
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .collect()
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_transfer_gas() -> u64 {
    DEFAULT_TRANSFER_GAS
}

fn default_epoch_tag() -> String {
    DEFAULT_EPOCH_TAG.to_string()
}

impl Settings {
    /// Load settings from the file named by `CFX_SENDER_CONFIG`
    pub fn load() -> Result<Self> {
        let config_path = env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    /// Load settings from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::parse(&config_str)
    }

    /// Parse settings from TOML text
    pub fn parse(input: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(input);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        let urls = self.rpc.endpoints();
        if urls.is_empty() {
            anyhow::bail!("At least one RPC URL must be configured");
        }
        if urls.len() != self.rpc.urls.len() {
            tracing::warn!("Ignoring empty RPC URL entries");
        }

        if self.rpc.timeout_ms == 0 {
            anyhow::bail!("rpc.timeout_ms must be greater than zero");
        }

        if self.sender.transfer_gas == 0 {
            anyhow::bail!("sender.transfer_gas must be greater than zero");
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(input, |caps: &regex::Captures<'_>| {
            env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}
