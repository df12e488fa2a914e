//! Exported type descriptors and the module declaration.
//!
//! A plugin module publishes a list of [`ExportedType`]s. Each descriptor
//! carries the type's fully-qualified name, its optional metadata, the set of
//! capabilities it implements and a no-argument construction path.
//!
//! Capabilities are declared through [`TypeBuilder`], whose methods are
//! bounded on the matching traits: `initializable()` only compiles when the
//! type implements [`SupportInitPlugin`], `configurable::<T>()` only when it
//! implements [`SupportConfigPlugin<T>`]. The host reads the resulting
//! capability set instead of relying on a common base type.
//!
//! ## Module Declaration
//!
//! ```text
//! #[no_mangle] static plugin_factory_module: ModuleDeclaration
//!     abi_version  -> must equal ABI_VERSION
//!     sdk_version  -> must equal SDK_VERSION (this crate's version)
//!     register     -> fn(&mut ModuleExports)
//! ```

use crate::metadata::PluginMetadata;
use crate::plugin::{Capability, ConfigType, Plugin, SupportConfigPlugin, SupportInitPlugin};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Current module ABI version.
pub const ABI_VERSION: u32 = 1;

/// Version of this crate; modules built against another version are rejected.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the declaration symbol every native module exports.
pub const MODULE_DECLARATION_SYMBOL: &[u8] = b"plugin_factory_module\0";

/// Registration function a module uses to publish its types.
pub type RegisterFn = fn(&mut ModuleExports);

/// Constructs a fresh plugin instance.
pub type PluginConstructor = Arc<dyn Fn() -> anyhow::Result<Box<dyn Plugin>> + Send + Sync>;

/// Constructs a fresh instance viewed through its initialization capability.
pub type InitConstructor =
    Arc<dyn Fn() -> anyhow::Result<Box<dyn SupportInitPlugin>> + Send + Sync>;

/// Declaration exported by every native plugin module.
#[derive(Clone, Copy)]
pub struct ModuleDeclaration {
    pub abi_version: u32,
    pub sdk_version: &'static str,
    pub register: RegisterFn,
}

impl fmt::Debug for ModuleDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDeclaration")
            .field("abi_version", &self.abi_version)
            .field("sdk_version", &self.sdk_version)
            .finish_non_exhaustive()
    }
}

/// Export a module declaration from a plugin `cdylib`.
///
/// ```rust,ignore
/// fn register(exports: &mut ModuleExports) { /* ... */ }
///
/// export_module!(register);
/// ```
#[macro_export]
macro_rules! export_module {
    ($register:path) => {
        #[doc(hidden)]
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        pub static plugin_factory_module: $crate::exports::ModuleDeclaration =
            $crate::exports::ModuleDeclaration {
                abi_version: $crate::exports::ABI_VERSION,
                sdk_version: $crate::exports::SDK_VERSION,
                register: $register,
            };
    };
}

/// Descriptor of one type exported by a module.
pub struct ExportedType {
    full_name: String,
    metadata: Option<PluginMetadata>,
    capabilities: Vec<Capability>,
    constructor: Option<PluginConstructor>,
    init_constructor: Option<InitConstructor>,
}

impl ExportedType {
    /// Start describing a plugin type.
    pub fn plugin<P: Plugin>() -> TypeBuilder<P> {
        TypeBuilder {
            metadata: None,
            capabilities: vec![Capability::Plugin],
            constructor: None,
            init_cast: None,
            _marker: PhantomData,
        }
    }

    /// Describe an exported type that is not a plugin.
    pub fn opaque<T: ?Sized + 'static>() -> Self {
        Self::named(std::any::type_name::<T>())
    }

    /// Describe a non-plugin type by name only.
    pub fn named(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            metadata: None,
            capabilities: Vec::new(),
            constructor: None,
            init_constructor: None,
        }
    }

    /// Fully-qualified type name.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Declared metadata, if any.
    pub fn metadata(&self) -> Option<&PluginMetadata> {
        self.metadata.as_ref()
    }

    /// Declared capabilities, in declaration order.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Check whether the type declares a capability.
    pub fn implements(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// Configuration payload types, in declaration order.
    pub fn config_types(&self) -> impl Iterator<Item = ConfigType> + '_ {
        self.capabilities.iter().filter_map(|cap| match cap {
            Capability::SupportConfig(config) => Some(config.clone()),
            _ => None,
        })
    }

    /// Whether a no-argument construction path was declared.
    pub fn is_constructible(&self) -> bool {
        self.constructor.is_some()
    }

    /// Construct a new instance.
    ///
    /// Returns `None` when the type has no construction path.
    pub fn create_instance(&self) -> Option<anyhow::Result<Box<dyn Plugin>>> {
        self.constructor.as_ref().map(|ctor| ctor())
    }

    /// Construct a new instance through its initialization capability.
    ///
    /// Returns `None` when the type is not initializable or has no
    /// construction path.
    pub fn create_init_instance(&self) -> Option<anyhow::Result<Box<dyn SupportInitPlugin>>> {
        self.init_constructor.as_ref().map(|ctor| ctor())
    }
}

impl fmt::Debug for ExportedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedType")
            .field("full_name", &self.full_name)
            .field("metadata", &self.metadata)
            .field("capabilities", &self.capabilities)
            .field("constructible", &self.constructor.is_some())
            .finish()
    }
}

/// Builder for a plugin type's descriptor.
pub struct TypeBuilder<P> {
    metadata: Option<PluginMetadata>,
    capabilities: Vec<Capability>,
    constructor: Option<fn() -> anyhow::Result<P>>,
    init_cast: Option<fn(P) -> Box<dyn SupportInitPlugin>>,
    _marker: PhantomData<fn() -> P>,
}

impl<P: Plugin> TypeBuilder<P> {
    /// Attach declarative metadata.
    pub fn with_metadata(mut self, metadata: PluginMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Use `P::default()` as the no-argument construction path.
    pub fn constructible(self) -> Self
    where
        P: Default,
    {
        self.with_constructor(|| Ok(P::default()))
    }

    /// Use a fallible no-argument construction path.
    pub fn with_constructor(mut self, constructor: fn() -> anyhow::Result<P>) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Declare the initialization capability.
    pub fn initializable(mut self) -> Self
    where
        P: SupportInitPlugin,
    {
        self.push_capability(Capability::SupportInit);
        self.init_cast = Some(|plugin: P| -> Box<dyn SupportInitPlugin> { Box::new(plugin) });
        self
    }

    /// Declare the typed configuration capability for payload `T`.
    pub fn configurable<T: 'static>(mut self) -> Self
    where
        P: SupportConfigPlugin<T>,
    {
        self.push_capability(Capability::SupportConfig(ConfigType::of::<T>()));
        self
    }

    fn push_capability(&mut self, capability: Capability) {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
    }

    /// Finish the descriptor.
    pub fn build(self) -> ExportedType {
        let constructor = self.constructor.map(|ctor| -> PluginConstructor {
            Arc::new(move || ctor().map(|plugin| Box::new(plugin) as Box<dyn Plugin>))
        });

        let init_constructor = match (self.constructor, self.init_cast) {
            (Some(ctor), Some(cast)) => {
                let init: InitConstructor = Arc::new(move || ctor().map(cast));
                Some(init)
            }
            _ => None,
        };

        ExportedType {
            full_name: std::any::type_name::<P>().to_string(),
            metadata: self.metadata,
            capabilities: self.capabilities,
            constructor,
            init_constructor,
        }
    }
}

/// Types published by one module.
#[derive(Debug, Default)]
pub struct ModuleExports {
    types: Vec<ExportedType>,
}

impl ModuleExports {
    /// Create an empty export list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a type.
    pub fn export(&mut self, exported: ExportedType) -> &mut Self {
        self.types.push(exported);
        self
    }

    /// Number of published types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExportedType> {
        self.types.iter()
    }

    /// Consume the list, keeping publication order.
    pub fn into_types(self) -> Vec<ExportedType> {
        self.types
    }

    /// Run a registration function against a fresh export list.
    pub fn collect(register: RegisterFn) -> Self {
        let mut exports = Self::new();
        register(&mut exports);
        exports
    }
}
