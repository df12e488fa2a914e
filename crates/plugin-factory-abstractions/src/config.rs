//! Typed plugin configuration.
//!
//! The host keeps one settings section per plugin id. A configurable plugin
//! turns its section into its declared configuration type through a
//! [`PluginConfigProvider`]; the discovery pipeline never reads it.

use crate::error::{PluginError, PluginResult};
use serde::de::DeserializeOwned;

/// Exposes a single read-only configuration object of type `T`.
pub trait PluginConfigProvider<T>: Send + Sync {
    fn configuration(&self) -> &T;
}

/// Configuration deserialized from a plugin's settings section.
#[derive(Debug, Clone)]
pub struct SectionConfigProvider<T> {
    configuration: T,
}

impl<T> SectionConfigProvider<T> {
    /// Wrap an already-built configuration.
    pub fn new(configuration: T) -> Self {
        Self { configuration }
    }

    pub fn into_inner(self) -> T {
        self.configuration
    }
}

impl<T: DeserializeOwned> SectionConfigProvider<T> {
    /// Deserialize a settings section; `None` reads as an empty table.
    pub fn from_section(plugin_id: &str, section: Option<&serde_json::Value>) -> PluginResult<Self> {
        let value = section
            .cloned()
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        serde_json::from_value(value)
            .map(Self::new)
            .map_err(|source| PluginError::Config {
                plugin_id: plugin_id.to_string(),
                source,
            })
    }
}

impl<T: Send + Sync> PluginConfigProvider<T> for SectionConfigProvider<T> {
    fn configuration(&self) -> &T {
        &self.configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Greeting {
        text: String,
        #[serde(default = "default_times")]
        times: u32,
    }

    fn default_times() -> u32 {
        1
    }

    #[test]
    fn test_from_section() {
        let section = json!({"text": "hi", "times": 2});
        let provider = SectionConfigProvider::<Greeting>::from_section("greeter", Some(&section)).unwrap();
        assert_eq!(
            provider.configuration(),
            &Greeting {
                text: "hi".to_string(),
                times: 2
            }
        );
    }

    #[test]
    fn test_invalid_section() {
        let section = json!({"times": "many"});
        let err = SectionConfigProvider::<Greeting>::from_section("greeter", Some(&section)).unwrap_err();
        assert!(err.to_string().contains("greeter"));
    }

    #[test]
    fn test_missing_required_field() {
        let result = SectionConfigProvider::<Greeting>::from_section("greeter", None);
        assert!(result.is_err());
    }
}
