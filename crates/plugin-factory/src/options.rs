//! Factory options.
//!
//! Options can be built in code or loaded from TOML:
//!
//! ```toml
//! plugin_path = "/usr/lib/myapp/plugins"
//! module_extension = "so"
//! init_failure_policy = "continue"
//!
//! [plugins.greeter]
//! enabled = true
//!
//! [plugins.greeter.settings]
//! greeting = "Hi"
//! ```

use crate::error::{FactoryError, FactoryResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// What the initialization driver does when one plugin fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitFailurePolicy {
    /// Stop at the first failure and return it.
    #[default]
    Abort,
    /// Log the failure, record it in the report and keep going.
    Continue,
}

/// Per-plugin host settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Whether the host enables this plugin after discovery.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Settings section handed to the plugin's configuration provider.
    #[serde(default = "default_settings")]
    pub settings: serde_json::Value,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            settings: default_settings(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_settings() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn default_plugin_path() -> PathBuf {
    PathBuf::from("plugins")
}

fn default_module_extension() -> String {
    std::env::consts::DLL_EXTENSION.to_string()
}

/// Options for [`PluginFactory`](crate::PluginFactory).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginFactoryOptions {
    /// Root directory scanned for plugin modules.
    #[serde(default = "default_plugin_path")]
    pub plugin_path: PathBuf,

    /// Extension of module files, with or without the leading dot.
    #[serde(default = "default_module_extension")]
    pub module_extension: String,

    #[serde(default)]
    pub init_failure_policy: InitFailurePolicy,

    /// Settings keyed by plugin id.
    #[serde(default)]
    pub plugins: HashMap<String, PluginSettings>,
}

impl Default for PluginFactoryOptions {
    fn default() -> Self {
        Self {
            plugin_path: default_plugin_path(),
            module_extension: default_module_extension(),
            init_failure_policy: InitFailurePolicy::default(),
            plugins: HashMap::new(),
        }
    }
}

impl PluginFactoryOptions {
    /// Options scanning `plugin_path` with everything else defaulted.
    pub fn new(plugin_path: impl Into<PathBuf>) -> Self {
        Self {
            plugin_path: plugin_path.into(),
            ..Self::default()
        }
    }

    pub fn with_module_extension(mut self, extension: impl Into<String>) -> Self {
        self.module_extension = extension.into();
        self
    }

    pub fn with_init_failure_policy(mut self, policy: InitFailurePolicy) -> Self {
        self.init_failure_policy = policy;
        self
    }

    /// Add settings for one plugin id.
    pub fn with_plugin(mut self, id: impl Into<String>, settings: PluginSettings) -> Self {
        self.plugins.insert(id.into(), settings);
        self
    }

    /// Parse options from a TOML string.
    pub fn from_toml_str(content: &str) -> FactoryResult<Self> {
        let options: Self = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> FactoryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate the options.
    pub fn validate(&self) -> FactoryResult<()> {
        if self.plugin_path.as_os_str().is_empty() {
            return Err(FactoryError::InvalidOptions(
                "plugin_path must not be empty".to_string(),
            ));
        }

        let extension = self.module_extension();
        if extension.is_empty() {
            return Err(FactoryError::InvalidOptions(
                "module_extension must not be empty".to_string(),
            ));
        }
        if extension.contains(['/', '\\']) {
            return Err(FactoryError::InvalidOptions(format!(
                "module_extension '{}' must not contain path separators",
                extension
            )));
        }

        for (id, settings) in &self.plugins {
            if id.trim().is_empty() {
                return Err(FactoryError::InvalidOptions(
                    "plugin settings key must not be empty".to_string(),
                ));
            }
            if !settings.settings.is_object() {
                return Err(FactoryError::InvalidOptions(format!(
                    "settings for plugin '{}' must be a table",
                    id
                )));
            }
        }

        Ok(())
    }

    /// Module extension without the leading dot.
    pub fn module_extension(&self) -> &str {
        self.module_extension.trim_start_matches('.')
    }

    /// Settings sections keyed by plugin id, as seen by init contexts.
    pub fn plugin_settings(&self) -> HashMap<String, serde_json::Value> {
        self.plugins
            .iter()
            .map(|(id, s)| (id.clone(), s.settings.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let options = PluginFactoryOptions::default();
        assert_eq!(options.plugin_path, PathBuf::from("plugins"));
        assert_eq!(options.module_extension(), std::env::consts::DLL_EXTENSION);
        assert_eq!(options.init_failure_policy, InitFailurePolicy::Abort);
        assert!(options.plugins.is_empty());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
plugin_path = "/opt/app/plugins"
module_extension = ".so"
init_failure_policy = "continue"

[plugins.greeter]
enabled = false

[plugins.greeter.settings]
greeting = "Hi"
times = 2

[plugins.hello]
"#;

        let options = PluginFactoryOptions::from_toml_str(toml).unwrap();
        assert_eq!(options.plugin_path, PathBuf::from("/opt/app/plugins"));
        assert_eq!(options.module_extension(), "so");
        assert_eq!(options.init_failure_policy, InitFailurePolicy::Continue);

        let greeter = &options.plugins["greeter"];
        assert!(!greeter.enabled);
        assert_eq!(greeter.settings["greeting"], "Hi");
        assert_eq!(greeter.settings["times"], 2);

        let hello = &options.plugins["hello"];
        assert!(hello.enabled);
        assert!(hello.settings.as_object().unwrap().is_empty());

        let settings = options.plugin_settings();
        assert_eq!(settings.len(), 2);
        assert_eq!(settings["greeter"]["times"], 2);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let options = PluginFactoryOptions::from_toml_str("").unwrap();
        assert_eq!(options, PluginFactoryOptions::default());
    }

    #[test]
    fn test_validate_rejects_bad_extension() {
        let options = PluginFactoryOptions::new("plugins").with_module_extension(".");
        assert!(matches!(
            options.validate(),
            Err(FactoryError::InvalidOptions(_))
        ));

        let options = PluginFactoryOptions::new("plugins").with_module_extension("a/b");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_path() {
        let options = PluginFactoryOptions::new("");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_invalid_policy() {
        let result = PluginFactoryOptions::from_toml_str(r#"init_failure_policy = "retry""#);
        assert!(matches!(result, Err(FactoryError::Toml(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "plugin_path = \"/tmp/plugins\"").unwrap();

        let options = PluginFactoryOptions::load(file.path()).unwrap();
        assert_eq!(options.plugin_path, PathBuf::from("/tmp/plugins"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = PluginFactoryOptions::load(Path::new("/no/such/options.toml"));
        assert!(matches!(result, Err(FactoryError::Io(_))));
    }
}
