//! Isolated module loading.
//!
//! Every call to [`ModuleLoader::load`] creates a new [`ModuleContext`]: a
//! private boundary holding the module's exported type descriptors and,
//! for native modules, its own library handle. Two modules may export types
//! with identical names; their descriptors live in different contexts and
//! never alias. A context is dropped once nothing references it.
//!
//! ## Native Modules
//!
//! Native modules are `cdylib`s built with `export_module!`. On Unix they are
//! opened with `RTLD_LOCAL`, so symbols from one module are not visible to
//! the next one.
//!
//! Dropping a context releases its descriptors but never unloads the
//! library. Services, errors and type names created by plugin code carry
//! vtables and data from the library and may outlive every record, so a
//! native module stays mapped until the process exits.

use crate::error::{FactoryError, FactoryResult};
use chrono::{DateTime, Utc};
use libloading::Library;
use plugin_factory_abstractions::exports::{
    ModuleDeclaration, ABI_VERSION, MODULE_DECLARATION_SYMBOL, SDK_VERSION,
};
use plugin_factory_abstractions::{ExportedType, ModuleExports, RegisterFn};
use std::collections::HashMap;
use std::fmt;
use std::mem::ManuallyDrop;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Identifier of one isolated module context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One loaded module and everything it exported.
pub struct ModuleContext {
    id: ContextId,
    path: PathBuf,
    loaded_at: DateTime<Utc>,
    exports: Vec<Arc<ExportedType>>,
    // Never dropped; see the module docs.
    library: Option<ManuallyDrop<Library>>,
}

impl ModuleContext {
    fn new(path: &Path, exports: ModuleExports, library: Option<Library>) -> Self {
        Self {
            id: ContextId::new(),
            path: path.to_path_buf(),
            loaded_at: Utc::now(),
            exports: exports.into_types().into_iter().map(Arc::new).collect(),
            library: library.map(ManuallyDrop::new),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Path of the module file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Exported types, in publication order.
    pub fn exports(&self) -> &[Arc<ExportedType>] {
        &self.exports
    }

    /// Whether the context owns a native library handle.
    pub fn is_native(&self) -> bool {
        self.library.is_some()
    }
}

impl fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("loaded_at", &self.loaded_at)
            .field("exports", &self.exports.len())
            .field("native", &self.is_native())
            .finish()
    }
}

/// Loads one module file into a fresh isolated context.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &Path) -> FactoryResult<Arc<ModuleContext>>;
}

/// Run a module's registration function, turning a panic into a load failure.
fn collect_exports(path: &Path, register: RegisterFn) -> FactoryResult<ModuleExports> {
    panic::catch_unwind(AssertUnwindSafe(|| ModuleExports::collect(register)))
        .map_err(|_| FactoryError::load_failed(path, "module registration panicked"))
}

/// Loader for native dynamic libraries (.so, .dylib, .dll).
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeModuleLoader;

impl NativeModuleLoader {
    pub fn new() -> Self {
        Self
    }

    fn check_declaration(path: &Path, declaration: &ModuleDeclaration) -> FactoryResult<()> {
        if declaration.abi_version != ABI_VERSION {
            return Err(FactoryError::AbiMismatch {
                path: path.to_path_buf(),
                expected: format!("abi {}", ABI_VERSION),
                found: format!("abi {}", declaration.abi_version),
            });
        }

        if declaration.sdk_version != SDK_VERSION {
            return Err(FactoryError::AbiMismatch {
                path: path.to_path_buf(),
                expected: format!("sdk {}", SDK_VERSION),
                found: format!("sdk {}", declaration.sdk_version),
            });
        }

        Ok(())
    }
}

#[cfg(unix)]
unsafe fn open_isolated(path: &Path) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_LOCAL, RTLD_NOW};

    UnixLibrary::open(Some(path), RTLD_NOW | RTLD_LOCAL).map(Library::from)
}

#[cfg(not(unix))]
unsafe fn open_isolated(path: &Path) -> Result<Library, libloading::Error> {
    Library::new(path)
}

impl ModuleLoader for NativeModuleLoader {
    fn load(&self, path: &Path) -> FactoryResult<Arc<ModuleContext>> {
        if !path.is_file() {
            return Err(FactoryError::load_failed(path, "module file not found"));
        }

        // SAFETY: loading a library runs its initializers; plugin modules are
        // trusted code built against this crate's abstractions.
        let library = unsafe { open_isolated(path) }
            .map_err(|e| FactoryError::load_failed(path, format!("failed to open library: {}", e)))?;

        // SAFETY: `export_module!` defines the symbol as a `ModuleDeclaration`
        // static; the version checks below reject modules built otherwise.
        let declaration: ModuleDeclaration = unsafe {
            let symbol = library
                .get::<*const ModuleDeclaration>(MODULE_DECLARATION_SYMBOL)
                .map_err(|e| {
                    FactoryError::load_failed(path, format!("missing module declaration: {}", e))
                })?;
            (*symbol).read()
        };

        Self::check_declaration(path, &declaration)?;

        let exports = collect_exports(path, declaration.register)?;
        let context = ModuleContext::new(path, exports, Some(library));
        debug!(
            "Loaded native module {:?} into context {} ({} exported types)",
            path,
            context.id(),
            context.exports().len()
        );

        Ok(Arc::new(context))
    }
}

/// Loader for modules linked into the host.
///
/// Modules are registered under their file name; loading a path looks its
/// file name up and runs the registration function into a new context.
#[derive(Debug, Clone, Default)]
pub struct StaticModuleLoader {
    modules: HashMap<String, RegisterFn>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under a file name such as `hello.so`.
    pub fn with_module(mut self, file_name: impl Into<String>, register: RegisterFn) -> Self {
        self.register(file_name, register);
        self
    }

    pub fn register(&mut self, file_name: impl Into<String>, register: RegisterFn) {
        self.modules.insert(file_name.into(), register);
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(&self, path: &Path) -> FactoryResult<Arc<ModuleContext>> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FactoryError::load_failed(path, "module path has no file name"))?;

        let register = self.modules.get(file_name).copied().ok_or_else(|| {
            FactoryError::load_failed(path, format!("no static module named '{}'", file_name))
        })?;

        let exports = collect_exports(path, register)?;
        let context = ModuleContext::new(path, exports, None);
        debug!(
            "Loaded static module {:?} into context {} ({} exported types)",
            path,
            context.id(),
            context.exports().len()
        );

        Ok(Arc::new(context))
    }
}
