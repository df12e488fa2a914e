//! Plugin registry.
//!
//! The system of record for classified plugins: an ordered, append-only
//! sequence behind one lock. Duplicate ids are kept as separate records;
//! hosts that care disambiguate by type handle.

use crate::info::PluginInfo;
use parking_lot::RwLock;
use plugin_factory_abstractions::{PluginCatalog, PluginSummary};
use std::sync::Arc;

/// Thread-safe registry of plugin records.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: RwLock<Vec<Arc<PluginInfo>>>,
}

impl PluginRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records under one exclusive lock, returning the stored records.
    pub fn append(&self, plugins: Vec<PluginInfo>) -> Vec<Arc<PluginInfo>> {
        let added: Vec<Arc<PluginInfo>> = plugins.into_iter().map(Arc::new).collect();
        if !added.is_empty() {
            self.plugins.write().extend(added.iter().cloned());
        }
        added
    }

    /// All records, in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<PluginInfo>> {
        self.plugins.read().clone()
    }

    /// Get the number of records.
    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }

    /// All records with the given id.
    pub fn find(&self, id: &str) -> Vec<Arc<PluginInfo>> {
        self.plugins
            .read()
            .iter()
            .filter(|p| p.id == id)
            .cloned()
            .collect()
    }

    /// Set the enable flag on every record with the given id.
    ///
    /// Returns the number of records changed.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> usize {
        let plugins = self.plugins.read();
        let mut count = 0;
        for plugin in plugins.iter().filter(|p| p.id == id) {
            plugin.set_enabled(enabled);
            count += 1;
        }
        count
    }

    /// Set the enable flag on every record.
    pub fn set_all_enabled(&self, enabled: bool) {
        for plugin in self.plugins.read().iter() {
            plugin.set_enabled(enabled);
        }
    }

    /// Plain snapshots of every record.
    pub fn summaries(&self) -> Vec<PluginSummary> {
        self.plugins.read().iter().map(|p| p.summary()).collect()
    }

    /// Records that are both initializable and enabled, in insertion order.
    pub fn initializable(&self) -> Vec<Arc<PluginInfo>> {
        self.plugins
            .read()
            .iter()
            .filter(|p| p.can_init && p.enabled())
            .cloned()
            .collect()
    }
}

impl PluginCatalog for PluginRegistry {
    fn plugins(&self) -> Vec<PluginSummary> {
        self.summaries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify_module;
    use crate::loader::{ModuleLoader, StaticModuleLoader};
    use plugin_factory_abstractions::{
        ExportedType, ModuleExports, Plugin, PluginInitContext, PluginMetadata, SupportInitPlugin,
    };
    use std::path::Path;

    #[derive(Default)]
    struct Alpha;
    impl Plugin for Alpha {}

    #[derive(Default)]
    struct Beta;
    impl Plugin for Beta {}
    impl SupportInitPlugin for Beta {
        fn init(&mut self, _context: &PluginInitContext<'_>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn register(exports: &mut ModuleExports) {
        exports
            .export(
                ExportedType::plugin::<Alpha>()
                    .with_metadata(PluginMetadata::new().with_id("alpha"))
                    .build(),
            )
            .export(
                ExportedType::plugin::<Beta>()
                    .with_metadata(PluginMetadata::new().with_id("beta"))
                    .constructible()
                    .initializable()
                    .build(),
            );
    }

    fn records() -> Vec<PluginInfo> {
        let context = StaticModuleLoader::new()
            .with_module("m.so", register)
            .load(Path::new("m.so"))
            .unwrap();
        classify_module(&context)
    }

    #[test]
    fn test_append_preserves_order() {
        let registry = PluginRegistry::new();
        assert!(registry.is_empty());

        let added = registry.append(records());
        assert_eq!(added.len(), 2);

        let ids: Vec<_> = registry.snapshot().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_duplicate_ids_retained() {
        let registry = PluginRegistry::new();
        registry.append(records());
        registry.append(records());

        assert_eq!(registry.len(), 4);
        let alphas = registry.find("alpha");
        assert_eq!(alphas.len(), 2);
        assert_ne!(alphas[0].type_handle, alphas[1].type_handle);
    }

    #[test]
    fn test_set_enabled() {
        let registry = PluginRegistry::new();
        registry.append(records());
        registry.append(records());

        assert!(registry.initializable().is_empty());
        assert_eq!(registry.set_enabled("beta", true), 2);
        assert_eq!(registry.set_enabled("missing", true), 0);
        assert_eq!(registry.initializable().len(), 2);

        registry.set_all_enabled(false);
        assert!(registry.initializable().is_empty());
    }

    #[test]
    fn test_catalog_view() {
        let registry = PluginRegistry::new();
        registry.append(records());
        registry.set_enabled("alpha", true);

        let summaries = registry.summaries();
        assert_eq!(registry.plugins(), summaries);
        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].enabled);
        assert!(!summaries[0].can_init);
        assert!(summaries[1].can_init);
        assert_eq!(registry.find("beta").len(), 1);
        assert!(PluginCatalog::find(&registry, "beta").is_some());
    }
}
