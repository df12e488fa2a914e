//! Configuration file loading and management
//!
//! This module handles loading and parsing the host configuration from
//! `$XDG_CONFIG_HOME/plugin-factory/config.toml`. If the configuration file
//! doesn't exist, a default configuration is created with documented comments.

use anyhow::{Context, Result};
use plugin_factory::PluginFactoryOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main host configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Host-specific configuration
    #[serde(default)]
    pub host: HostConfig,
    /// Plugin factory options, including per-plugin sections
    #[serde(default)]
    pub factory: PluginFactoryOptions,
}

/// Host behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    /// Log level (trace, debug, info, warn, error)
    /// Default: "info"
    pub log_level: String,
    /// Upper bound for one discovery pass, in seconds
    /// Default: none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_timeout_secs: Option<u64>,
    /// Enable every discovered plugin before applying per-plugin sections
    /// Default: false
    pub enable_all: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            load_timeout_secs: None,
            enable_all: false,
        }
    }
}

impl HostConfig {
    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration from the specified path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default XDG config location
    ///
    /// If the configuration file doesn't exist, creates a default configuration
    /// file with documented comments.
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_file(&config_path)?;
        }

        Self::load(&config_path)
    }

    /// Returns `$XDG_CONFIG_HOME/plugin-factory/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "raibid-labs", "plugin-factory")
            .context("Failed to determine project directories")?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Create a default configuration file with documented comments
    pub fn create_default_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write default config file: {}", path.display()))?;

        tracing::info!("Created default configuration file at: {}", path.display());
        Ok(())
    }

    /// Generate the default configuration file content with comments
    fn default_config_content() -> String {
        r#"# Plugin Factory Host Configuration

[host]
# Log level: trace, debug, info, warn, error
# Default: "info"
log_level = "info"

# Upper bound for one discovery pass, in seconds
# load_timeout_secs = 30

# Enable every discovered plugin; [factory.plugins.<id>] sections still apply
# Default: false
enable_all = false

[factory]
# Root directory scanned for plugin modules
# Default: "plugins"
plugin_path = "plugins"

# Module file extension; defaults to the platform library extension
# module_extension = "so"

# What to do when a plugin fails to initialize: "abort" or "continue"
# Default: "abort"
init_failure_policy = "abort"

# Per-plugin sections, keyed by plugin id:
# - enabled: whether the host enables the plugin (default: true)
# - settings: table handed to the plugin's configuration provider

# Example: the sample greeter plugin
# [factory.plugins.greeter]
# enabled = true
#
# [factory.plugins.greeter.settings]
# greeting = "Hello"
# times = 1
"#
        .to_string()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.host.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log_level: {}. Must be one of: {}",
                self.host.log_level,
                valid_log_levels.join(", ")
            );
        }

        if self.host.load_timeout_secs == Some(0) {
            anyhow::bail!("host.load_timeout_secs must be greater than 0");
        }

        self.factory
            .validate()
            .context("Invalid [factory] configuration")?;

        Ok(())
    }
}
