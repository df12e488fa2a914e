//! Initialization driver.
//!
//! Selects records that are both initializable and enabled, constructs one
//! instance per record and calls its `init` entry point. Instances are
//! handed back to the caller so they live as long as their module context.

use crate::error::{FactoryError, FactoryResult};
use crate::info::PluginInfo;
use crate::options::InitFailurePolicy;
use crate::registry::PluginRegistry;
use plugin_factory_abstractions::{PluginInitContext, ServiceCollection, SupportInitPlugin};
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An initialized plugin instance and the record it was built from.
pub struct InitializedPlugin {
    // The instance runs code from the record's module; it must drop first.
    instance: Box<dyn SupportInitPlugin>,
    record: Arc<PluginInfo>,
}

impl InitializedPlugin {
    pub fn record(&self) -> &Arc<PluginInfo> {
        &self.record
    }

    pub fn instance(&self) -> &dyn SupportInitPlugin {
        self.instance.as_ref()
    }
}

impl fmt::Debug for InitializedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializedPlugin")
            .field("id", &self.record.id)
            .field("type_handle", &self.record.type_handle)
            .finish()
    }
}

/// A plugin that failed to initialize under [`InitFailurePolicy::Continue`].
#[derive(Debug)]
pub struct InitFailure {
    pub plugin_id: String,
    pub error: FactoryError,
}

/// Outcome of one initialization pass.
#[derive(Debug, Default)]
pub struct InitReport {
    /// Ids of plugins initialized, in registry order.
    pub initialized: Vec<String>,

    pub failures: Vec<InitFailure>,
}

impl InitReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs `init` on every enabled, initializable plugin.
#[derive(Debug, Clone)]
pub struct PluginInitializer {
    plugin_path: PathBuf,
    policy: InitFailurePolicy,
    settings: HashMap<String, serde_json::Value>,
}

impl PluginInitializer {
    pub fn new(plugin_path: impl Into<PathBuf>) -> Self {
        Self {
            plugin_path: plugin_path.into(),
            policy: InitFailurePolicy::default(),
            settings: HashMap::new(),
        }
    }

    pub fn with_policy(mut self, policy: InitFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Settings sections keyed by plugin id.
    pub fn with_settings(mut self, settings: HashMap<String, serde_json::Value>) -> Self {
        self.settings = settings;
        self
    }

    /// Initialize the selected plugins in registry order.
    ///
    /// Successfully initialized instances are pushed onto `instances` even
    /// when a later plugin aborts the pass.
    pub fn run(
        &self,
        registry: &PluginRegistry,
        services: &ServiceCollection,
        instances: &mut Vec<InitializedPlugin>,
    ) -> FactoryResult<InitReport> {
        let selected = registry.initializable();
        let mut report = InitReport::default();

        if selected.is_empty() {
            debug!("No enabled initializable plugins");
            return Ok(report);
        }

        let dispatch = tracing::dispatcher::get_default(|current| current.clone());
        let context =
            PluginInitContext::new(&self.plugin_path, registry, services, &self.settings)
                .with_dispatch(dispatch);

        for record in selected {
            match Self::init_one(&record, &context) {
                Ok(instance) => {
                    info!("Initialized plugin {}", record.id);
                    report.initialized.push(record.id.clone());
                    instances.push(InitializedPlugin { instance, record });
                }
                Err(error) => match self.policy {
                    InitFailurePolicy::Abort => return Err(error),
                    InitFailurePolicy::Continue => {
                        warn!("{}", error);
                        report.failures.push(InitFailure {
                            plugin_id: record.id.clone(),
                            error,
                        });
                    }
                },
            }
        }

        Ok(report)
    }

    fn init_one(
        record: &PluginInfo,
        context: &PluginInitContext<'_>,
    ) -> FactoryResult<Box<dyn SupportInitPlugin>> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut instance = record
                .type_handle
                .create_init_instance()
                .map_err(|e| relabel(e, &record.id))?;
            instance.init(context).map_err(|e| FactoryError::InitializationFailed {
                plugin_id: record.id.clone(),
                reason: format!("{:#}", e),
            })?;
            Ok::<_, FactoryError>(instance)
        }));

        match outcome {
            Ok(result) => result,
            Err(_) => Err(FactoryError::InitializationFailed {
                plugin_id: record.id.clone(),
                reason: "plugin panicked".to_string(),
            }),
        }
    }
}

/// Report construction errors under the plugin id rather than the type name.
fn relabel(error: FactoryError, plugin_id: &str) -> FactoryError {
    match error {
        FactoryError::MissingConstructor(_) => FactoryError::MissingConstructor(plugin_id.to_string()),
        FactoryError::InitializationFailed { reason, .. } => FactoryError::InitializationFailed {
            plugin_id: plugin_id.to_string(),
            reason,
        },
        other => other,
    }
}
