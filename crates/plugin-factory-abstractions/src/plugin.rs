//! Capability traits implemented by plugin types.
//!
//! A type is a plugin when it implements [`Plugin`]. Everything else is an
//! optional capability the host discovers from the type's exported
//! descriptor: [`SupportInitPlugin`] for an initialization entry point and
//! [`SupportConfigPlugin<T>`] for a typed configuration payload.

use crate::context::PluginInitContext;
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Base marker capability. Every plugin type implements this.
pub trait Plugin: Send + Sync + 'static {}

/// Plugins that run an initialization step once the host has finished
/// discovery.
pub trait SupportInitPlugin: Plugin {
    /// Called exactly once per enabled plugin record.
    fn init(&mut self, context: &PluginInitContext<'_>) -> anyhow::Result<()>;
}

/// Plugins that accept a typed configuration payload `T`.
///
/// The trait has no methods: it only ties the plugin type to its
/// configuration type so the host can report it. The plugin reads the
/// payload itself through a [`crate::PluginConfigProvider`].
pub trait SupportConfigPlugin<T: 'static>: Plugin {}

/// Identity of a configuration payload type.
///
/// The name is owned: a descriptor built inside a native module must not
/// borrow the module's static data.
#[derive(Clone)]
pub struct ConfigType {
    type_name: Arc<str>,
    type_id: TypeId,
}

impl ConfigType {
    /// Describe the configuration type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            type_name: Arc::from(std::any::type_name::<T>()),
            type_id: TypeId::of::<T>(),
        }
    }

    /// Fully-qualified name of the configuration type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Check whether this describes `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for ConfigType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ConfigType {}

impl Hash for ConfigType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConfigType").field(&self.type_name).finish()
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name)
    }
}

/// A capability declared by an exported type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// The type implements [`Plugin`].
    Plugin,

    /// The type implements [`SupportInitPlugin`].
    SupportInit,

    /// The type implements [`SupportConfigPlugin`] for the given payload.
    SupportConfig(ConfigType),
}

impl Capability {
    /// Short name used in classification logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Plugin => "plugin",
            Capability::SupportInit => "support_init",
            Capability::SupportConfig(_) => "support_config",
        }
    }
}
