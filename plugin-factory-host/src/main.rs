//! # plugin-factory-host
//!
//! Reference host for the plugin factory.
//!
//! The host:
//! - Loads its configuration (TOML)
//! - Discovers plugin modules under the configured plugin root
//! - Enables plugins per configuration
//! - Initializes the enabled plugins and prints the registry
//!
//! ## Running
//!
//! ```bash
//! # Discover and initialize plugins with the default configuration
//! cargo run --bin plugin-factory-host
//!
//! # List what a directory contains without initializing anything
//! cargo run --bin plugin-factory-host -- --plugin-path target/debug --list
//!
//! # With debug logging
//! RUST_LOG=debug cargo run --bin plugin-factory-host
//! ```

use anyhow::Result;
use clap::Parser;
use plugin_factory::abstractions::PluginSummary;
use plugin_factory::PluginFactory;
use plugin_factory_host::config::Config;
use plugin_factory_host::{apply_enablement, load_with_timeout};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Discover, enable and initialize plugins from a plugin root
#[derive(Parser)]
#[command(name = "plugin-factory-host", version, about)]
struct Cli {
    /// Configuration file (defaults to the XDG config location)
    #[arg(short, long, env = "PLUGIN_FACTORY_CONFIG")]
    config: Option<PathBuf>,

    /// Plugin root, overriding the configuration
    #[arg(long, env = "PLUGIN_FACTORY_PATH")]
    plugin_path: Option<PathBuf>,

    /// Enable every discovered plugin
    #[arg(long)]
    enable_all: bool,

    /// Discover only; skip initialization
    #[arg(long)]
    list: bool,

    /// Print plugin records as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.host.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    if let Some(plugin_path) = &cli.plugin_path {
        config.factory.plugin_path = plugin_path.clone();
    }
    if cli.enable_all {
        config.host.enable_all = true;
    }

    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    info!("Starting plugin-factory-host v{}", env!("CARGO_PKG_VERSION"));
    info!("Plugin root: {}", config.factory.plugin_path.display());

    let factory = Arc::new(PluginFactory::new(config.factory.clone())?);

    let report = load_with_timeout(Arc::clone(&factory), config.host.load_timeout()).await?;
    info!(
        "Discovery finished: {} plugin(s), {} failure(s)",
        report.plugins.len(),
        report.failures.len()
    );

    apply_enablement(&factory, config.host.enable_all);

    if !cli.list {
        let init = factory.init()?;
        for failure in &init.failures {
            tracing::warn!("Plugin {} failed: {}", failure.plugin_id, failure.error);
        }
    }

    let summaries = factory.registry().summaries();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print_table(&summaries);
    }

    Ok(())
}

fn print_table(summaries: &[PluginSummary]) {
    if summaries.is_empty() {
        println!("No plugins found");
        return;
    }

    println!("{:<24} {:<24} {:<7} {:<7} {:<7}", "ID", "NAME", "INIT", "CONFIG", "ENABLED");
    for plugin in summaries {
        println!(
            "{:<24} {:<24} {:<7} {:<7} {:<7}",
            plugin.id, plugin.name, plugin.can_init, plugin.can_config, plugin.enabled
        );
    }
}
