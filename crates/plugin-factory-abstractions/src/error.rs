//! Error types for plugin-facing operations.

use thiserror::Error;

/// Errors a plugin can hit while talking to the host.
#[derive(Error, Debug)]
pub enum PluginError {
    /// The plugin's settings section does not match its configuration type.
    #[error("Invalid configuration for plugin '{plugin_id}': {source}")]
    Config {
        plugin_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required host service was never registered.
    #[error("Service not registered: {0}")]
    ServiceMissing(String),
}

/// Result type for plugin-facing operations.
pub type PluginResult<T> = std::result::Result<T, PluginError>;
