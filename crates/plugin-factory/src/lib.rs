//! # plugin-factory
//!
//! Host-side plugin pipeline: discovery, isolated loading, capability
//! classification and initialization.
//!
//! This crate provides:
//! - Discovery of module files under a plugin root through a virtual
//!   directory provider
//! - Isolated module contexts, one per load (native libraries or statically
//!   linked modules)
//! - Capability classification of every exported type
//! - A thread-safe plugin registry
//! - The initialization driver for enabled plugins
//!
//! ## Plugin Root Layout
//!
//! ```text
//! plugins/
//!   hello.so            standalone module
//!   Foo/                isolated plugin folder
//!     Foo.so            the module, named after the folder
//!     Foo.deps.so       private dependency, never loaded as a plugin
//! ```
//!
//! ## Lifecycle
//!
//! `load()` may run any number of times, also concurrently. The host then
//! flips enable flags on the records it wants and calls `init()` once.

pub mod classifier;
pub mod discovery;
pub mod error;
pub mod factory;
pub mod file_provider;
pub mod info;
pub mod init;
pub mod loader;
pub mod options;
pub mod registry;

pub use classifier::{classify, classify_module};
pub use discovery::{DiscoveryReport, LoadFailure, PluginDiscovery};
pub use error::{FactoryError, FactoryResult};
pub use factory::PluginFactory;
pub use file_provider::{
    DirectoryContents, FileEntry, FileProvider, MemoryFileProvider, PhysicalFileProvider,
};
pub use info::{PluginInfo, TypeHandle};
pub use init::{InitFailure, InitReport, InitializedPlugin, PluginInitializer};
pub use loader::{ContextId, ModuleContext, ModuleLoader, NativeModuleLoader, StaticModuleLoader};
pub use options::{InitFailurePolicy, PluginFactoryOptions, PluginSettings};
pub use registry::PluginRegistry;

pub use plugin_factory_abstractions as abstractions;
