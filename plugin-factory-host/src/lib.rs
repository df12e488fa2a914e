//! Plugin factory host library
//!
//! The pieces of the reference host that are worth testing on their own:
//! configuration, the bounded discovery pass and plugin enablement.

pub mod config;

use anyhow::{Context, Result};
use plugin_factory::{DiscoveryReport, PluginFactory};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Run one discovery pass on a blocking thread.
///
/// With a timeout, the pass is abandoned once it expires and an error is
/// returned; the blocking thread finishes on its own and its records still
/// land in the registry.
pub async fn load_with_timeout(
    factory: Arc<PluginFactory>,
    timeout: Option<Duration>,
) -> Result<DiscoveryReport> {
    let task = tokio::task::spawn_blocking(move || factory.load());

    let report = match timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .with_context(|| format!("Plugin discovery timed out after {:?}", limit))?,
        None => task.await,
    }
    .context("Plugin discovery task failed")?;

    for failure in &report.failures {
        warn!("Skipped {}: {}", failure.path.display(), failure.error);
    }

    Ok(report)
}

/// Turn on the plugins the host wants, returning how many are enabled.
///
/// `enable_all` flips every record on first; per-plugin sections are applied
/// afterwards, so `enabled = false` in a section always wins.
pub fn apply_enablement(factory: &PluginFactory, enable_all: bool) -> usize {
    if enable_all {
        factory.registry().set_all_enabled(true);
    }
    factory.apply_enabled_flags();

    let enabled = factory.plugins().iter().filter(|p| p.enabled()).count();
    info!("{} plugin(s) enabled", enabled);
    enabled
}
