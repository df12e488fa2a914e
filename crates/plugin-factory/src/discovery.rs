//! Plugin discovery from a plugin root.
//!
//! Two layouts are recognized at the top level of the root:
//!
//! 1. A standalone module file carrying the module extension, loaded
//!    directly (`plugins/hello.so`).
//! 2. An isolated plugin folder holding the module plus its private
//!    dependencies (`plugins/Foo/Foo.so`, `plugins/Foo/Foo.deps.so`). Only
//!    the child whose stem equals the folder name is loaded; the platform
//!    library prefix is accepted, so `plugins/hello/libhello.so` matches too.
//!
//! Each candidate goes through the module loader into its own context and
//! every exported type is classified. Records from all candidates are
//! appended to the registry in one step at the end of the scan.

use crate::classifier::classify_module;
use crate::error::FactoryError;
use crate::file_provider::{FileEntry, FileProvider};
use crate::info::PluginInfo;
use crate::loader::ModuleLoader;
use crate::registry::PluginRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A module that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: FactoryError,
}

/// Outcome of one discovery pass.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Records added by this pass, in discovery order.
    pub plugins: Vec<Arc<PluginInfo>>,

    /// Candidates that failed to load.
    pub failures: Vec<LoadFailure>,
}

impl DiscoveryReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Walks a plugin root and feeds module files through loader and classifier.
pub struct PluginDiscovery {
    file_provider: Arc<dyn FileProvider>,
    loader: Arc<dyn ModuleLoader>,
    module_extension: String,
}

impl PluginDiscovery {
    pub fn new(
        file_provider: Arc<dyn FileProvider>,
        loader: Arc<dyn ModuleLoader>,
        module_extension: impl Into<String>,
    ) -> Self {
        Self {
            file_provider,
            loader,
            module_extension: module_extension.into().trim_start_matches('.').to_string(),
        }
    }

    pub fn module_extension(&self) -> &str {
        &self.module_extension
    }

    /// Module files found under the root, in provider order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let root = self.file_provider.directory_contents("");
        if !root.exists() {
            debug!("Plugin root does not exist; nothing to discover");
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for entry in &root {
            if entry.is_directory {
                if let Some(path) = self.isolated_module(&entry.name) {
                    candidates.push(path);
                }
            } else if has_extension(&entry.name, &self.module_extension) {
                match &entry.physical_path {
                    Some(path) => candidates.push(path.clone()),
                    None => debug!("Skipping {}: no physical path", entry.name),
                }
            } else {
                debug!("Skipping {}: not a module file", entry.name);
            }
        }

        candidates
    }

    /// Find the module file inside an isolated plugin folder.
    fn isolated_module(&self, folder: &str) -> Option<PathBuf> {
        let contents = self.file_provider.directory_contents(folder);
        let mut matches = contents.entries().iter().filter(|child| {
            !child.is_directory
                && has_extension(&child.name, &self.module_extension)
                && stem_matches(&child.name, folder)
        });

        let Some(module) = matches.next() else {
            debug!("Skipping folder {}: no module named after it", folder);
            return None;
        };
        for other in matches {
            debug!(
                "Folder {} has several module files; ignoring {}",
                folder, other.name
            );
        }

        physical_path(module)
    }

    /// Scan the root, append everything found to `registry` and report.
    ///
    /// A missing or empty root is a no-op. A module that fails to load is
    /// logged and recorded; the scan goes on with the next candidate.
    pub fn scan(&self, registry: &PluginRegistry) -> DiscoveryReport {
        let mut discovered = Vec::new();
        let mut failures = Vec::new();

        for path in self.candidates() {
            match self.loader.load(&path) {
                Ok(context) => {
                    let plugins = classify_module(&context);
                    info!(
                        "Discovered module {:?}: {} plugin(s) in context {} (loaded {})",
                        path,
                        plugins.len(),
                        context.id(),
                        context.loaded_at().to_rfc3339()
                    );
                    for plugin in &plugins {
                        debug!(
                            "Classified {} (type {}, init: {}, config: {})",
                            plugin.id,
                            plugin.type_handle.full_name(),
                            plugin.can_init,
                            plugin.can_config
                        );
                    }
                    discovered.extend(plugins);
                }
                Err(error) => {
                    warn!("Failed to load plugin module {:?}: {}", path, error);
                    failures.push(LoadFailure { path, error });
                }
            }
        }

        let plugins = registry.append(discovered);
        DiscoveryReport { plugins, failures }
    }
}

fn physical_path(entry: &FileEntry) -> Option<PathBuf> {
    if entry.physical_path.is_none() {
        debug!("Skipping {}: no physical path", entry.name);
    }
    entry.physical_path.clone()
}

fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

fn stem_matches(name: &str, folder: &str) -> bool {
    let Some(stem) = Path::new(name).file_stem().and_then(|s| s.to_str()) else {
        return false;
    };

    if stem.eq_ignore_ascii_case(folder) {
        return true;
    }

    let prefix = std::env::consts::DLL_PREFIX;
    !prefix.is_empty()
        && stem.len() > prefix.len()
        && stem.is_char_boundary(prefix.len())
        && stem[..prefix.len()].eq_ignore_ascii_case(prefix)
        && stem[prefix.len()..].eq_ignore_ascii_case(folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_provider::{MemoryFileProvider, PhysicalFileProvider};
    use crate::loader::StaticModuleLoader;
    use plugin_factory_abstractions::{ExportedType, ModuleExports, Plugin};
    use tempfile::TempDir;

    #[derive(Default)]
    struct Counter;
    impl Plugin for Counter {}

    fn register_counter(exports: &mut ModuleExports) {
        exports.export(ExportedType::plugin::<Counter>().constructible().build());
    }

    fn discovery(provider: impl FileProvider + 'static, loader: StaticModuleLoader) -> PluginDiscovery {
        PluginDiscovery::new(Arc::new(provider), Arc::new(loader), "so")
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("a.so", "so"));
        assert!(has_extension("A.SO", "so"));
        assert!(!has_extension("a.so.1", "so"));
        assert!(!has_extension("so", "so"));
        assert!(!has_extension("a.dll", "so"));
    }

    #[test]
    fn test_stem_matches() {
        assert!(stem_matches("Foo.so", "Foo"));
        assert!(stem_matches("foo.so", "FOO"));
        assert!(!stem_matches("Foo.deps.so", "Foo"));
        assert!(!stem_matches("Bar.so", "Foo"));
    }

    #[cfg(unix)]
    #[test]
    fn test_stem_matches_library_prefix() {
        assert!(stem_matches("libhello.so", "hello"));
        assert!(!stem_matches("lib.so", ""));
        assert!(!stem_matches("libother.so", "hello"));
    }

    #[test]
    fn test_extension_dot_is_trimmed() {
        let d = PluginDiscovery::new(
            Arc::new(MemoryFileProvider::new()),
            Arc::new(StaticModuleLoader::new()),
            ".so",
        );
        assert_eq!(d.module_extension(), "so");
    }

    #[test]
    fn test_missing_root_is_noop() {
        let registry = PluginRegistry::new();
        let d = discovery(MemoryFileProvider::default(), StaticModuleLoader::new());

        let report = d.scan(&registry);
        assert!(report.plugins.is_empty());
        assert!(report.is_clean());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_candidates_skip_sidecars_and_other_files() {
        let provider = MemoryFileProvider::new()
            .with_file("", "a.so", "/p/a.so")
            .with_file("", "readme.txt", "/p/readme.txt")
            .with_directory("", "Foo")
            .with_file("Foo", "Foo.deps.so", "/p/Foo/Foo.deps.so")
            .with_file("Foo", "Foo.pdb", "/p/Foo/Foo.pdb")
            .with_file("Foo", "Foo.so", "/p/Foo/Foo.so")
            .with_directory("", "Empty");

        let d = discovery(provider, StaticModuleLoader::new());
        assert_eq!(
            d.candidates(),
            vec![PathBuf::from("/p/a.so"), PathBuf::from("/p/Foo/Foo.so")]
        );
    }

    #[test]
    fn test_nested_module_in_folder_child_ignored() {
        let provider = MemoryFileProvider::new()
            .with_directory("", "Foo")
            .with_directory("Foo", "Foo.so");

        let d = discovery(provider, StaticModuleLoader::new());
        assert!(d.candidates().is_empty());
    }

    #[test]
    fn test_scan_on_disk_layout() {
        let temp_dir = TempDir::new().unwrap();
        let foo = temp_dir.path().join("Foo");
        std::fs::create_dir(&foo).unwrap();
        std::fs::write(foo.join("Foo.so"), b"").unwrap();
        std::fs::write(foo.join("Foo.deps.so"), b"").unwrap();

        let loader = StaticModuleLoader::new()
            .with_module("Foo.so", register_counter)
            .with_module("Foo.deps.so", register_counter);
        let d = discovery(PhysicalFileProvider::new(temp_dir.path()), loader);

        let registry = PluginRegistry::new();
        let report = d.scan(&registry);

        assert!(report.is_clean());
        assert_eq!(report.plugins.len(), 1);
        assert_eq!(report.plugins[0].type_handle.module_path(), foo.join("Foo.so"));
    }

    #[test]
    fn test_load_failure_does_not_stop_scan() {
        let provider = MemoryFileProvider::new()
            .with_file("", "broken.so", "/p/broken.so")
            .with_file("", "counter.so", "/p/counter.so");
        let loader = StaticModuleLoader::new().with_module("counter.so", register_counter);

        let registry = PluginRegistry::new();
        let report = discovery(provider, loader).scan(&registry);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, PathBuf::from("/p/broken.so"));
        assert!(report.failures[0].error.is_load_failure());
        assert_eq!(report.plugins.len(), 1);
        assert_eq!(registry.len(), 1);
    }
}
