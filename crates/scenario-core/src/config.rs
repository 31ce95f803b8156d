//! Configuration loading and typed config structures for the scenario harness.
//!
//! Configuration is an optional YAML file (conventionally
//! `scenario-config.yaml`). Every field has a default, so an empty file or
//! no file at all yields a working development setup. Environment variables
//! override the file, and command-line flags override both.

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use serde::Deserialize;

use crate::fetcher::DispatchOptions;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held a value of the wrong shape.
    #[error("invalid value `{value}` for {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScenarioConfig {
    /// Target network and sending account.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Fetcher dispatch behaviour.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Where deployments are saved between runs.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// In-memory development chain.
    #[serde(default)]
    pub dev_chain: DevChainConfig,

    /// Extra contract artifacts.
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ScenarioConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `SCENARIO_NETWORK` overrides `network.name`
    /// - `SCENARIO_FROM` overrides `network.from`
    /// - `SCENARIO_NETWORKS_DIR` overrides `persistence.networks_dir`
    /// - `SCENARIO_STRICT_CATCHALL` overrides `dispatch.strict_catchall`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidEnv`] if an override cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from `path` when given, else start from defaults; then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let mut config = Self::default();
                config.apply_env_overrides()?;
                Ok(config)
            }
        }
    }

    /// Parse configuration from a YAML string, without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("SCENARIO_NETWORK") {
            self.network.name = val;
        }
        if let Some(val) = lookup("SCENARIO_FROM") {
            self.network.from =
                val.parse::<Address>()
                    .ok()
                    .ok_or_else(|| ConfigError::InvalidEnv {
                        var: "SCENARIO_FROM",
                        value: val.clone(),
                    })?;
        }
        if let Some(val) = lookup("SCENARIO_NETWORKS_DIR") {
            self.persistence.networks_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("SCENARIO_STRICT_CATCHALL") {
            self.dispatch.strict_catchall = parse_flag(&val).ok_or(ConfigError::InvalidEnv {
                var: "SCENARIO_STRICT_CATCHALL",
                value: val,
            })?;
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Target network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    /// Network name; selects the saved deployment file.
    #[serde(default = "default_network_name")]
    pub name: String,

    /// Account that sends every transaction.
    #[serde(default = "default_from")]
    pub from: Address,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: default_network_name(),
            from: default_from(),
        }
    }
}

/// Dispatch configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DispatchConfig {
    /// Reject leftover input even for catchall fetchers.
    #[serde(default)]
    pub strict_catchall: bool,
}

impl From<DispatchConfig> for DispatchOptions {
    fn from(config: DispatchConfig) -> Self {
        Self {
            strict_catchall: config.strict_catchall,
        }
    }
}

/// Deployment persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Save the world after every successful step.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding `<network>.json` files.
    #[serde(default = "default_networks_dir")]
    pub networks_dir: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            networks_dir: default_networks_dir(),
        }
    }
}

/// Development chain configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DevChainConfig {
    /// Seed for generated addresses and transaction hashes.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for DevChainConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
        }
    }
}

/// Artifact loading configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory of `*.json` artifacts added to the built-in set.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_network_name() -> String {
    "development".to_owned()
}

const fn default_from() -> Address {
    Address::with_last_byte(1)
}

const fn default_true() -> bool {
    true
}

fn default_networks_dir() -> PathBuf {
    PathBuf::from("networks")
}

const fn default_seed() -> u64 {
    42
}

fn default_log_level() -> String {
    "info".to_owned()
}
