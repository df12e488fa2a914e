//! # plugin-factory-abstractions
//!
//! The surface plugin modules are built against.
//!
//! This crate provides:
//! - Capability traits (`Plugin`, `SupportInitPlugin`, `SupportConfigPlugin<T>`)
//! - The declarative metadata annotation (`PluginMetadata`)
//! - Exported type descriptors and the module declaration (`export_module!`)
//! - The initialization context handed to plugins by the host
//! - The host service collection and typed configuration providers
//!
//! ## Writing a Plugin Module
//!
//! A module is a `cdylib` that declares which types it exports:
//!
//! ```rust,ignore
//! use plugin_factory_abstractions::prelude::*;
//!
//! #[derive(Default)]
//! pub struct MyPlugin;
//!
//! impl Plugin for MyPlugin {}
//!
//! impl SupportInitPlugin for MyPlugin {
//!     fn init(&mut self, context: &PluginInitContext<'_>) -> anyhow::Result<()> {
//!         println!("plugins live in {}", context.plugin_path().display());
//!         Ok(())
//!     }
//! }
//!
//! fn register(exports: &mut ModuleExports) {
//!     exports.export(
//!         ExportedType::plugin::<MyPlugin>()
//!             .constructible()
//!             .initializable()
//!             .build(),
//!     );
//! }
//!
//! export_module!(register);
//! ```
//!
//! Module and host must be compiled with the same toolchain; the host checks
//! [`exports::ABI_VERSION`] and [`exports::SDK_VERSION`] before registering
//! anything.

pub mod config;
pub mod context;
pub mod error;
pub mod exports;
pub mod metadata;
pub mod plugin;
pub mod services;

pub use config::{PluginConfigProvider, SectionConfigProvider};
pub use context::{PluginCatalog, PluginInitContext, PluginSummary};
pub use error::{PluginError, PluginResult};
pub use exports::{ExportedType, ModuleDeclaration, ModuleExports, RegisterFn, TypeBuilder};
pub use metadata::PluginMetadata;
pub use plugin::{Capability, ConfigType, Plugin, SupportConfigPlugin, SupportInitPlugin};
pub use services::ServiceCollection;

/// Everything a plugin module usually needs.
pub mod prelude {
    pub use crate::config::{PluginConfigProvider, SectionConfigProvider};
    pub use crate::context::{PluginCatalog, PluginInitContext, PluginSummary};
    pub use crate::error::{PluginError, PluginResult};
    pub use crate::export_module;
    pub use crate::exports::{ExportedType, ModuleExports};
    pub use crate::metadata::PluginMetadata;
    pub use crate::plugin::{Plugin, SupportConfigPlugin, SupportInitPlugin};
    pub use crate::services::ServiceCollection;
}
