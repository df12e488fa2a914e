//! # plugin-hello
//!
//! A sample plugin module for testing and development.
//!
//! The module exports one type per capability combination:
//! - `EchoPlugin`: a plain plugin without metadata or entry points
//! - `HelloPlugin`: an initializable plugin that registers a service
//! - `GreeterPlugin`: an initializable plugin with typed configuration
//! - `GreetingLog`: a helper type that is not a plugin at all
//!
//! Build it as a `cdylib` and drop the library into a plugin root, or link
//! it statically and hand [`register`] to a static module loader.

use plugin_factory_abstractions::prelude::*;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub const HELLO_ID: &str = "hello";
pub const GREETER_ID: &str = "greeter";

/// A plugin with no declared metadata and no capabilities.
#[derive(Debug, Default)]
pub struct EchoPlugin;

impl Plugin for EchoPlugin {}

/// Service registered by [`HelloPlugin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloService {
    pub plugin_root: PathBuf,
}

/// Registers a [`HelloService`] pointing at the plugin root.
#[derive(Debug, Default)]
pub struct HelloPlugin {
    initialized: bool,
}

impl HelloPlugin {
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Plugin for HelloPlugin {}

impl SupportInitPlugin for HelloPlugin {
    fn init(&mut self, context: &PluginInitContext<'_>) -> anyhow::Result<()> {
        context.with_host_logging(|| info!("Hello from {}", context.plugin_path().display()));

        context.services().add(Arc::new(HelloService {
            plugin_root: context.plugin_path().to_path_buf(),
        }));
        self.initialized = true;
        Ok(())
    }
}

/// Configuration of [`GreeterPlugin`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GreeterConfig {
    pub greeting: String,
    pub times: usize,
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            greeting: "Hello".to_string(),
            times: 1,
        }
    }
}

/// Service registered by [`GreeterPlugin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeter {
    config: GreeterConfig,
}

impl Greeter {
    pub fn greet(&self, name: &str) -> String {
        vec![format!("{}, {}!", self.config.greeting, name); self.config.times].join(" ")
    }
}

/// Reads [`GreeterConfig`] from its settings section and registers a [`Greeter`].
#[derive(Debug, Default)]
pub struct GreeterPlugin;

impl Plugin for GreeterPlugin {}

impl SupportConfigPlugin<GreeterConfig> for GreeterPlugin {}

impl SupportInitPlugin for GreeterPlugin {
    fn init(&mut self, context: &PluginInitContext<'_>) -> anyhow::Result<()> {
        let provider = context.config_provider::<GreeterConfig>(GREETER_ID)?;
        if provider.configuration().times == 0 {
            anyhow::bail!("greeter.times must be at least 1");
        }

        context.services().add(Arc::new(Greeter {
            config: provider.into_inner(),
        }));
        Ok(())
    }
}

/// Exported alongside the plugins but carries no plugin capability.
#[derive(Debug, Default)]
pub struct GreetingLog {
    pub entries: Vec<String>,
}

/// Registration function for this module.
pub fn register(exports: &mut ModuleExports) {
    exports
        .export(ExportedType::plugin::<EchoPlugin>().constructible().build())
        .export(
            ExportedType::plugin::<HelloPlugin>()
                .with_metadata(
                    PluginMetadata::new()
                        .with_id(HELLO_ID)
                        .with_description("Registers the plugin root as a service"),
                )
                .constructible()
                .initializable()
                .build(),
        )
        .export(
            ExportedType::plugin::<GreeterPlugin>()
                .with_metadata(
                    PluginMetadata::new()
                        .with_id(GREETER_ID)
                        .with_name("Greeter")
                        .with_alias("greet")
                        .with_description("Greets people the configured way"),
                )
                .constructible()
                .initializable()
                .configurable::<GreeterConfig>()
                .build(),
        )
        .export(ExportedType::opaque::<GreetingLog>());
}

export_module!(register);
