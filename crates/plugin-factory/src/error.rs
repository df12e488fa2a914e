//! Error types for the plugin factory.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or initializing plugins.
#[derive(Error, Debug)]
pub enum FactoryError {
    /// A module could not be loaded into an isolated context.
    #[error("Failed to load module {}: {reason}", path.display())]
    LoadFailed { path: PathBuf, reason: String },

    /// A module was built against an incompatible abstractions crate.
    #[error("Module {} was built for {found}, expected {expected}", path.display())]
    AbiMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// A plugin failed to construct or initialize.
    #[error("Plugin '{plugin_id}' initialization failed: {reason}")]
    InitializationFailed { plugin_id: String, reason: String },

    /// An initializable plugin declared no no-argument construction path.
    #[error("Plugin '{0}' has no accessible no-argument constructor")]
    MissingConstructor(String),

    /// Options failed validation.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl FactoryError {
    pub(crate) fn load_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        FactoryError::LoadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors raised while loading a module.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            FactoryError::LoadFailed { .. } | FactoryError::AbiMismatch { .. }
        )
    }

    /// True for errors raised while initializing a plugin.
    pub fn is_initialization_failure(&self) -> bool {
        matches!(
            self,
            FactoryError::InitializationFailed { .. } | FactoryError::MissingConstructor(_)
        )
    }
}

/// Result type for factory operations.
pub type FactoryResult<T> = std::result::Result<T, FactoryError>;
