//! Native loader tests against the `plugin-hello` cdylib.
//!
//! The library is looked up next to the test binary, or at
//! `PLUGIN_HELLO_DYLIB`. Tests skip when it has not been built.

use plugin_factory::{PluginFactory, PluginFactoryOptions};
use std::env::consts::{DLL_EXTENSION, DLL_PREFIX};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn hello_dylib() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("PLUGIN_HELLO_DYLIB") {
        return Some(PathBuf::from(path));
    }

    let file_name = format!("{}plugin_hello.{}", DLL_PREFIX, DLL_EXTENSION);
    let exe = std::env::current_exe().ok()?;
    // target/<profile>/deps/<test> and target/<profile>/<lib>
    exe.ancestors()
        .skip(1)
        .take(2)
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}

/// Two copies of the sample module under a fresh root.
fn native_root() -> Option<TempDir> {
    let Some(dylib) = hello_dylib() else {
        eprintln!("plugin-hello cdylib not found; skipping native loader test");
        return None;
    };

    let root = TempDir::new().unwrap();
    for name in ["alpha", "beta"] {
        let target = root.path().join(format!("{}.{}", name, DLL_EXTENSION));
        std::fs::copy(&dylib, target).unwrap();
    }
    Some(root)
}

#[test]
fn test_native_modules_load_into_separate_contexts() {
    let Some(root) = native_root() else { return };
    let factory = PluginFactory::new(PluginFactoryOptions::new(root.path())).unwrap();

    let report = factory.load();
    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.plugins.len(), 6);

    let first = report.plugins[0].type_handle.context();
    let last = report.plugins[5].type_handle.context();
    assert!(first.is_native());
    assert!(last.is_native());
    assert_ne!(first.id(), last.id());
    assert_ne!(first.path(), last.path());
    assert_eq!(
        report.plugins[0].type_handle.full_name(),
        report.plugins[3].type_handle.full_name()
    );
}

#[test]
fn test_native_values_outlive_factory() {
    let Some(root) = native_root() else { return };
    let factory = PluginFactory::new(PluginFactoryOptions::new(root.path())).unwrap();

    factory.load();
    factory.registry().set_all_enabled(true);
    let init = factory.init().unwrap();
    assert_eq!(init.initialized.len(), 4);
    assert!(!factory.services().is_empty());

    let config_type = factory
        .plugins()
        .iter()
        .find_map(|plugin| plugin.config_type.clone())
        .unwrap();
    let services = Arc::clone(factory.services());

    drop(factory);

    assert!(config_type.type_name().ends_with("GreeterConfig"));
    assert!(format!("{}", config_type).ends_with("GreeterConfig"));
    assert!(!services.is_empty());
    drop(services);
}
