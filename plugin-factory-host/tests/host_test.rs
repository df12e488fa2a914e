//! Integration tests for the host's discovery and enablement helpers.

use plugin_factory::abstractions::ModuleExports;
use plugin_factory::{
    FactoryResult, MemoryFileProvider, ModuleContext, ModuleLoader, PluginFactory,
    PluginFactoryOptions, PluginSettings, StaticModuleLoader,
};
use plugin_factory_host::config::Config;
use plugin_factory_host::{apply_enablement, load_with_timeout};
use plugin_hello::{Greeter, GREETER_ID, HELLO_ID};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

fn hello_factory(options: PluginFactoryOptions) -> Arc<PluginFactory> {
    let factory = PluginFactory::new(options.with_module_extension("so"))
        .unwrap()
        .with_file_provider(Arc::new(
            MemoryFileProvider::new().with_file("", "hello.so", "/plugins/hello.so"),
        ))
        .with_loader(Arc::new(
            StaticModuleLoader::new().with_module("hello.so", plugin_hello::register),
        ));
    Arc::new(factory)
}

struct SlowLoader {
    delay: Duration,
    inner: StaticModuleLoader,
}

impl ModuleLoader for SlowLoader {
    fn load(&self, path: &Path) -> FactoryResult<Arc<ModuleContext>> {
        std::thread::sleep(self.delay);
        self.inner.load(path)
    }
}

fn register_nothing(_exports: &mut ModuleExports) {}

#[tokio::test]
async fn test_load_without_timeout() {
    let factory = hello_factory(PluginFactoryOptions::new("/plugins"));

    let report = load_with_timeout(Arc::clone(&factory), None).await.unwrap();
    assert_eq!(report.plugins.len(), 3);
    assert_eq!(factory.registry().len(), 3);
}

#[tokio::test]
async fn test_load_within_timeout() {
    let factory = hello_factory(PluginFactoryOptions::new("/plugins"));

    let report = load_with_timeout(factory, Some(Duration::from_secs(10)))
        .await
        .unwrap();
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_load_timeout_expires() {
    let loader = SlowLoader {
        delay: Duration::from_millis(500),
        inner: StaticModuleLoader::new().with_module("slow.so", register_nothing),
    };
    let factory = PluginFactory::new(PluginFactoryOptions::new("/plugins").with_module_extension("so"))
        .unwrap()
        .with_file_provider(Arc::new(
            MemoryFileProvider::new().with_file("", "slow.so", "/plugins/slow.so"),
        ))
        .with_loader(Arc::new(loader));

    let err = load_with_timeout(Arc::new(factory), Some(Duration::from_millis(20)))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_enable_all_then_sections() {
    let options = PluginFactoryOptions::new("/plugins").with_plugin(
        GREETER_ID,
        PluginSettings {
            enabled: false,
            ..PluginSettings::default()
        },
    );
    let factory = hello_factory(options);
    load_with_timeout(Arc::clone(&factory), None).await.unwrap();

    assert_eq!(apply_enablement(&factory, true), 2);
    let report = factory.init().unwrap();
    assert_eq!(report.initialized, vec![HELLO_ID]);
    assert!(!factory.services().contains::<Greeter>());
}

#[tokio::test]
async fn test_config_file_drives_pipeline() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[host]
enable_all = false

[factory]
plugin_path = "/plugins"

[factory.plugins.greeter.settings]
greeting = "Ahoy"
times = 1
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    let factory = hello_factory(config.factory.clone());
    load_with_timeout(Arc::clone(&factory), config.host.load_timeout())
        .await
        .unwrap();

    assert_eq!(apply_enablement(&factory, config.host.enable_all), 1);
    factory.init().unwrap();

    let greeter = factory.services().require::<Greeter>().unwrap();
    assert_eq!(greeter.greet("Sam"), "Ahoy, Sam!");
}
