//! Host service registration surface.
//!
//! A typed map of shared services. The host creates one collection, passes it
//! through every [`PluginInitContext`](crate::PluginInitContext), and plugins
//! register or look up services by type.

use crate::error::{PluginError, PluginResult};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type ServiceMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Services shared between the host and its plugins.
#[derive(Default)]
pub struct ServiceCollection {
    services: RwLock<ServiceMap>,
}

impl ServiceCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service, replacing any previous service of the same type.
    ///
    /// Returns the replaced service.
    pub fn add<T: Any + Send + Sync>(&self, service: Arc<T>) -> Option<Arc<T>> {
        self.services
            .write()
            .insert(TypeId::of::<T>(), service)
            .and_then(|previous| previous.downcast::<T>().ok())
    }

    /// Look up a service by type.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services
            .read()
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|service| service.downcast::<T>().ok())
    }

    /// Look up a service that must have been registered.
    pub fn require<T: Any + Send + Sync>(&self) -> PluginResult<Arc<T>> {
        self.get::<T>()
            .ok_or_else(|| PluginError::ServiceMissing(std::any::type_name::<T>().to_string()))
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.services.read().contains_key(&TypeId::of::<T>())
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("len", &self.len())
            .finish()
    }
}
