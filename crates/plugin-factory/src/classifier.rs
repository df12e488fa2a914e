//! Capability classification of exported types.
//!
//! Rules, applied in order:
//!
//! 1. The type must declare the `Plugin` capability, otherwise it is not a
//!    plugin and yields no record.
//! 2. Declared metadata is copied.
//! 3. A blank id becomes the fully-qualified type name; a blank name becomes
//!    the resolved id.
//! 4. `SupportInit` sets `can_init`.
//! 5. The first declared `SupportConfig(T)` sets `can_config` and
//!    `config_type = T`; later ones are ignored.

use crate::info::{PluginInfo, TypeHandle};
use crate::loader::ModuleContext;
use plugin_factory_abstractions::{Capability, ExportedType};
use std::sync::Arc;
use tracing::debug;

/// Classify one exported type. Returns `None` for non-plugin types.
pub fn classify(context: &Arc<ModuleContext>, exported: &Arc<ExportedType>) -> Option<PluginInfo> {
    if !exported.implements(&Capability::Plugin) {
        debug!("Skipping {}: not a plugin", exported.full_name());
        return None;
    }

    debug!(
        "Classifying {} [{}]",
        exported.full_name(),
        exported
            .capabilities()
            .iter()
            .map(Capability::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let metadata = exported.metadata().cloned().unwrap_or_default();

    let id = if metadata.id.is_empty() {
        exported.full_name().to_string()
    } else {
        metadata.id
    };
    let name = if metadata.name.is_empty() {
        id.clone()
    } else {
        metadata.name
    };

    let can_init = exported.implements(&Capability::SupportInit);

    let mut config_types = exported.config_types();
    let config_type = config_types.next();
    for ignored in config_types {
        debug!(
            "Plugin {} declares additional configuration type {}; using {}",
            id,
            ignored,
            config_type.as_ref().map(|c| c.type_name()).unwrap_or_default()
        );
    }

    Some(PluginInfo::new(
        id,
        name,
        metadata.alias,
        metadata.description,
        config_type,
        can_init,
        TypeHandle::new(Arc::clone(context), Arc::clone(exported)),
    ))
}

/// Classify every type a module exported, keeping publication order.
pub fn classify_module(context: &Arc<ModuleContext>) -> Vec<PluginInfo> {
    context
        .exports()
        .iter()
        .filter_map(|exported| classify(context, exported))
        .collect()
}
