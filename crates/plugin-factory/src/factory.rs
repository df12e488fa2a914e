//! The plugin factory facade.

use crate::discovery::{DiscoveryReport, PluginDiscovery};
use crate::error::FactoryResult;
use crate::file_provider::{FileProvider, PhysicalFileProvider};
use crate::info::PluginInfo;
use crate::init::{InitReport, InitializedPlugin, PluginInitializer};
use crate::loader::{ModuleLoader, NativeModuleLoader};
use crate::options::PluginFactoryOptions;
use crate::registry::PluginRegistry;
use parking_lot::Mutex;
use plugin_factory_abstractions::ServiceCollection;
use std::sync::Arc;
use tracing::{debug, info};

/// Discovers, loads, classifies and initializes plugins for one host.
///
/// # Example
///
/// ```rust,ignore
/// let factory = PluginFactory::new(PluginFactoryOptions::new("/opt/app/plugins"))?;
/// let report = factory.load();
/// factory.apply_enabled_flags();
/// factory.init()?;
/// ```
pub struct PluginFactory {
    // Drop order: instances, then services, then the records.
    instances: Mutex<Vec<InitializedPlugin>>,
    services: Arc<ServiceCollection>,
    registry: Arc<PluginRegistry>,
    file_provider: Arc<dyn FileProvider>,
    loader: Arc<dyn ModuleLoader>,
    options: PluginFactoryOptions,
}

impl PluginFactory {
    /// Create a factory reading modules from disk with the native loader.
    pub fn new(options: PluginFactoryOptions) -> FactoryResult<Self> {
        options.validate()?;

        Ok(Self {
            instances: Mutex::new(Vec::new()),
            services: Arc::new(ServiceCollection::new()),
            registry: Arc::new(PluginRegistry::new()),
            file_provider: Arc::new(PhysicalFileProvider::new(options.plugin_path.clone())),
            loader: Arc::new(NativeModuleLoader::new()),
            options,
        })
    }

    /// Replace the directory provider.
    pub fn with_file_provider(mut self, file_provider: Arc<dyn FileProvider>) -> Self {
        self.file_provider = file_provider;
        self
    }

    /// Replace the module loader.
    pub fn with_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Share a host service collection with plugins.
    pub fn with_services(mut self, services: Arc<ServiceCollection>) -> Self {
        self.services = services;
        self
    }

    /// Scan the plugin root and register everything found.
    ///
    /// May be called from several threads at once; each call appends its
    /// own records.
    pub fn load(&self) -> DiscoveryReport {
        info!("Discovering plugins in {:?}", self.options.plugin_path);

        let discovery = PluginDiscovery::new(
            Arc::clone(&self.file_provider),
            Arc::clone(&self.loader),
            self.options.module_extension(),
        );
        let report = discovery.scan(&self.registry);

        info!(
            "Discovered {} plugin(s), {} module(s) failed to load",
            report.plugins.len(),
            report.failures.len()
        );
        report
    }

    /// Apply the `enabled` flag of every configured plugin section.
    ///
    /// Returns the number of records changed.
    pub fn apply_enabled_flags(&self) -> usize {
        let mut changed = 0;
        for (id, settings) in &self.options.plugins {
            let count = self.registry.set_enabled(id, settings.enabled);
            if count == 0 {
                debug!("Settings for plugin {} match no discovered plugin", id);
            }
            changed += count;
        }
        changed
    }

    /// Initialize every enabled, initializable plugin.
    pub fn init(&self) -> FactoryResult<InitReport> {
        let initializer = PluginInitializer::new(self.options.plugin_path.clone())
            .with_policy(self.options.init_failure_policy)
            .with_settings(self.options.plugin_settings());

        let mut instances = self.instances.lock();
        let report = initializer.run(&self.registry, &self.services, &mut instances)?;

        info!(
            "Initialized {} plugin(s), {} failed",
            report.initialized.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// All discovered records, in discovery order.
    pub fn plugins(&self) -> Vec<Arc<PluginInfo>> {
        self.registry.snapshot()
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn services(&self) -> &Arc<ServiceCollection> {
        &self.services
    }

    pub fn options(&self) -> &PluginFactoryOptions {
        &self.options
    }

    /// Ids of the plugin instances held by the factory.
    pub fn initialized(&self) -> Vec<String> {
        self.instances
            .lock()
            .iter()
            .map(|p| p.record().id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_provider::MemoryFileProvider;
    use crate::loader::StaticModuleLoader;
    use crate::options::PluginSettings;
    use plugin_factory_abstractions::{
        ExportedType, ModuleExports, Plugin, PluginInitContext, PluginMetadata, SupportInitPlugin,
    };

    #[derive(Default)]
    struct Starter;
    impl Plugin for Starter {}
    impl SupportInitPlugin for Starter {
        fn init(&mut self, _context: &PluginInitContext<'_>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn register(exports: &mut ModuleExports) {
        exports.export(
            ExportedType::plugin::<Starter>()
                .with_metadata(PluginMetadata::new().with_id("starter"))
                .constructible()
                .initializable()
                .build(),
        );
    }

    fn factory(options: PluginFactoryOptions) -> PluginFactory {
        PluginFactory::new(options)
            .unwrap()
            .with_file_provider(Arc::new(
                MemoryFileProvider::new().with_file("", "starter.so", "/p/starter.so"),
            ))
            .with_loader(Arc::new(
                StaticModuleLoader::new().with_module("starter.so", register),
            ))
    }

    #[test]
    fn test_new_validates_options() {
        assert!(PluginFactory::new(PluginFactoryOptions::new("")).is_err());
    }

    #[test]
    fn test_enabled_flags_drive_init() {
        let options = PluginFactoryOptions::new("/p")
            .with_module_extension("so")
            .with_plugin("starter", PluginSettings::default());
        let factory = factory(options);

        assert_eq!(factory.load().plugins.len(), 1);
        assert!(factory.init().unwrap().initialized.is_empty());

        assert_eq!(factory.apply_enabled_flags(), 1);
        let report = factory.init().unwrap();
        assert_eq!(report.initialized, vec!["starter"]);
        assert_eq!(factory.initialized(), vec!["starter"]);
    }

    #[test]
    fn test_disabled_section() {
        let options = PluginFactoryOptions::new("/p")
            .with_module_extension("so")
            .with_plugin(
                "starter",
                PluginSettings {
                    enabled: false,
                    ..PluginSettings::default()
                },
            );
        let factory = factory(options);
        factory.load();
        factory.registry().set_all_enabled(true);

        factory.apply_enabled_flags();
        assert!(!factory.plugins()[0].enabled());
    }
}
