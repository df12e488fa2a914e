//! Plugin records and type handles.

use crate::error::{FactoryError, FactoryResult};
use crate::loader::{ContextId, ModuleContext};
use plugin_factory_abstractions::{ConfigType, ExportedType, PluginSummary, SupportInitPlugin};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reference to one exported type inside one module context.
///
/// Holding a handle keeps the module context alive.
#[derive(Clone)]
pub struct TypeHandle {
    exported: Arc<ExportedType>,
    context: Arc<ModuleContext>,
}

impl TypeHandle {
    pub fn new(context: Arc<ModuleContext>, exported: Arc<ExportedType>) -> Self {
        Self { exported, context }
    }

    /// Fully-qualified type name.
    pub fn full_name(&self) -> &str {
        self.exported.full_name()
    }

    /// Context the type was loaded into.
    pub fn context_id(&self) -> ContextId {
        self.context.id()
    }

    pub fn context(&self) -> &Arc<ModuleContext> {
        &self.context
    }

    /// Path of the module file the type came from.
    pub fn module_path(&self) -> &Path {
        self.context.path()
    }

    pub fn exported_type(&self) -> &ExportedType {
        &self.exported
    }

    /// Construct a new instance viewed through its initialization capability.
    pub fn create_init_instance(&self) -> FactoryResult<Box<dyn SupportInitPlugin>> {
        match self.exported.create_init_instance() {
            Some(result) => result.map_err(|e| FactoryError::InitializationFailed {
                plugin_id: self.full_name().to_string(),
                reason: format!("{:#}", e),
            }),
            None => Err(FactoryError::MissingConstructor(self.full_name().to_string())),
        }
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.context.id() == other.context.id() && Arc::ptr_eq(&self.exported, &other.exported)
    }
}

impl Eq for TypeHandle {}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandle")
            .field("full_name", &self.full_name())
            .field("context", &self.context.id())
            .finish()
    }
}

/// A classified plugin type.
///
/// Records are immutable once created; only the host-controlled enable flag
/// changes afterwards.
pub struct PluginInfo {
    /// Stable identifier; the type's fully-qualified name unless declared.
    pub id: String,

    /// Display name; the resolved id unless declared.
    pub name: String,

    pub alias: String,

    pub description: String,

    /// Whether the type implements `SupportInitPlugin`.
    pub can_init: bool,

    /// Whether the type implements `SupportConfigPlugin<T>`.
    pub can_config: bool,

    /// The configuration payload type; set iff `can_config`.
    pub config_type: Option<ConfigType>,

    pub type_handle: TypeHandle,

    enabled: AtomicBool,
}

impl PluginInfo {
    pub(crate) fn new(
        id: String,
        name: String,
        alias: String,
        description: String,
        config_type: Option<ConfigType>,
        can_init: bool,
        type_handle: TypeHandle,
    ) -> Self {
        Self {
            id,
            name,
            alias,
            description,
            can_init,
            can_config: config_type.is_some(),
            config_type,
            type_handle,
            enabled: AtomicBool::new(false),
        }
    }

    /// Host-controlled enable flag; off until the host turns it on.
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Snapshot without the type handle.
    pub fn summary(&self) -> PluginSummary {
        PluginSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            alias: self.alias.clone(),
            description: self.description.clone(),
            type_name: self.type_handle.full_name().to_string(),
            can_init: self.can_init,
            can_config: self.can_config,
            config_type: self.config_type.as_ref().map(|c| c.type_name().to_string()),
            enabled: self.enabled(),
        }
    }
}

impl fmt::Debug for PluginInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("can_init", &self.can_init)
            .field("can_config", &self.can_config)
            .field("config_type", &self.config_type)
            .field("enabled", &self.enabled())
            .field("type_handle", &self.type_handle)
            .finish()
    }
}
