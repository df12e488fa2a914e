//! The initialization context handed to plugins.

use crate::config::SectionConfigProvider;
use crate::error::PluginResult;
use crate::services::ServiceCollection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::Dispatch;

/// Snapshot of one discovered plugin record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSummary {
    pub id: String,
    pub name: String,
    pub alias: String,
    pub description: String,
    /// Fully-qualified name of the plugin type.
    pub type_name: String,
    pub can_init: bool,
    pub can_config: bool,
    /// Fully-qualified name of the configuration type.
    pub config_type: Option<String>,
    pub enabled: bool,
}

/// Read-only view of the host's plugin records.
pub trait PluginCatalog: Send + Sync {
    /// All records, in discovery order.
    fn plugins(&self) -> Vec<PluginSummary>;

    /// First record with the given id.
    fn find(&self, id: &str) -> Option<PluginSummary> {
        self.plugins().into_iter().find(|p| p.id == id)
    }
}

/// Passed to [`SupportInitPlugin::init`](crate::SupportInitPlugin::init).
pub struct PluginInitContext<'a> {
    plugin_path: &'a Path,
    catalog: &'a dyn PluginCatalog,
    services: &'a ServiceCollection,
    settings: &'a HashMap<String, serde_json::Value>,
    dispatch: Option<Dispatch>,
}

impl<'a> PluginInitContext<'a> {
    pub fn new(
        plugin_path: &'a Path,
        catalog: &'a dyn PluginCatalog,
        services: &'a ServiceCollection,
        settings: &'a HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            plugin_path,
            catalog,
            services,
            settings,
            dispatch: None,
        }
    }

    /// Attach the host's tracing dispatcher.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Root directory plugins were discovered in.
    pub fn plugin_path(&self) -> &Path {
        self.plugin_path
    }

    /// The host's plugin records.
    pub fn catalog(&self) -> &dyn PluginCatalog {
        self.catalog
    }

    /// The host's service registration surface.
    pub fn services(&self) -> &ServiceCollection {
        self.services
    }

    /// Raw settings section for a plugin id.
    pub fn settings(&self, plugin_id: &str) -> Option<&serde_json::Value> {
        self.settings.get(plugin_id)
    }

    /// Run `f` with the host's dispatcher as the default.
    ///
    /// A native module links its own copy of `tracing` with no subscriber
    /// installed, so its events are dropped unless emitted inside this call.
    /// Without a host dispatcher `f` runs unchanged.
    pub fn with_host_logging<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }

    /// Typed configuration for a plugin id.
    ///
    /// A missing section deserializes from an empty table so `#[serde(default)]`
    /// fields still apply.
    pub fn config_provider<T: DeserializeOwned>(
        &self,
        plugin_id: &str,
    ) -> PluginResult<SectionConfigProvider<T>> {
        SectionConfigProvider::from_section(plugin_id, self.settings(plugin_id))
    }
}
