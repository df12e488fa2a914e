//! Declarative plugin metadata.
//!
//! Attached to an exported plugin type with
//! [`TypeBuilder::with_metadata`](crate::TypeBuilder::with_metadata). Every
//! field is optional; blank fields are filled in by the host when the type is
//! classified.

use serde::{Deserialize, Serialize};

/// Id, display name, alias and description of a plugin type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Stable identifier.
    #[serde(default)]
    pub id: String,

    /// Human-readable name.
    #[serde(default)]
    pub name: String,

    /// Short alternative name.
    #[serde(default)]
    pub alias: String,

    /// Plugin description.
    #[serde(default)]
    pub description: String,
}

impl PluginMetadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_fields() {
        let metadata = PluginMetadata::new()
            .with_id("hello")
            .with_name("Hello")
            .with_alias("hi")
            .with_description("Says hello");

        assert_eq!(metadata.id, "hello");
        assert_eq!(metadata.name, "Hello");
        assert_eq!(metadata.alias, "hi");
        assert_eq!(metadata.description, "Says hello");
    }

    #[test]
    fn test_partial_metadata_from_json() {
        let metadata: PluginMetadata = serde_json::from_str(r#"{"id": "only-id"}"#).unwrap();
        assert_eq!(metadata.id, "only-id");
        assert!(metadata.name.is_empty());
        assert!(metadata.alias.is_empty());
    }
}
