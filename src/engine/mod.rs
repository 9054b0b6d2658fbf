//! The bundling engine.
//!
//! The engine owns everything language-specific: parsing, TypeScript and JSX
//! lowering (via `oxc`), linking ES modules into a registry, and printing the
//! final bundle. It knows nothing about where files come from. That question
//! is answered by a [`BuildPlugin`], whose two hooks are the only way the
//! engine reaches source text.
//!
//! One engine is shared by the whole process. It is initialized lazily by the
//! first compile; compiles that arrive while initialization is running wait
//! for the same initialization instead of starting their own. After that the
//! engine is immutable and any number of builds may run against it at once,
//! each with its own plugin.

use crate::error::BundleError;
use crate::resolver::{ImportKind, LoadedModule, ResolveArgs, VfsPlugin};
use crate::vfs::VirtualFileMap;
use oxc_transformer::{JsxRuntime, TransformOptions};
use std::collections::BTreeMap;
use tokio::sync::OnceCell;
use tracing::{debug, info};

mod bootstrap;
mod linker;
mod transpile;

/// The hook contract between the engine and the code that owns the files.
pub trait BuildPlugin: Send + Sync {
    /// Maps a specifier to a module path.
    fn resolve(&self, args: &ResolveArgs<'_>) -> Result<String, BundleError>;

    /// Returns the raw content of a resolved module and the loader to parse it with.
    fn load(&self, path: &str) -> Result<LoadedModule, BundleError>;
}

/// Engine configuration.
///
/// JSX always lowers to classic `React.createElement(...)` calls, so a bundle
/// never imports a JSX runtime module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub minify: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { minify: true }
    }
}

impl EngineOptions {
    fn transform_options(&self) -> TransformOptions {
        let mut options = TransformOptions::default();
        options.jsx.runtime = JsxRuntime::Classic;
        options
    }
}

static SHARED: OnceCell<Engine> = OnceCell::const_new();

#[derive(Debug)]
pub struct Engine {
    options: EngineOptions,
    registry: String,
}

impl Engine {
    /// Creates a standalone engine. Most callers want [`Engine::shared`].
    pub fn new(options: EngineOptions) -> Result<Self, BundleError> {
        let registry = transpile::print_bundle(bootstrap::MODULE_REGISTRY, options.minify)?;
        Ok(Self { options, registry })
    }

    /// The process-wide engine, initialized with default options on first use.
    pub async fn shared() -> Result<&'static Engine, BundleError> {
        Self::shared_with(EngineOptions::default()).await
    }

    /// The process-wide engine. `options` only take effect if this call is the
    /// one that initializes it.
    pub async fn shared_with(options: EngineOptions) -> Result<&'static Engine, BundleError> {
        SHARED
            .get_or_try_init(|| async move {
                debug!(?options, "initializing bundling engine");
                Engine::new(options)
            })
            .await
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Bundles the module graph reachable from `entry` into one script.
    ///
    /// Modules are discovered depth-first through `plugin`. The output only
    /// depends on the plugin's answers, never on discovery order.
    pub fn build(&self, entry: &str, plugin: &dyn BuildPlugin) -> Result<String, BundleError> {
        let entry_path = plugin.resolve(&ResolveArgs::entry(entry))?;

        let mut modules: BTreeMap<String, String> = BTreeMap::new();
        let mut pending = vec![entry_path.clone()];
        while let Some(module_path) = pending.pop() {
            if modules.contains_key(&module_path) {
                continue;
            }
            let loaded = plugin.load(&module_path)?;
            let linked = if loaded.loader.is_script() {
                let source = transpile::transpile(&loaded, &self.options)?;
                let mut resolve = |specifier: &str, kind: ImportKind| {
                    plugin.resolve(&ResolveArgs {
                        path: specifier,
                        importer: &module_path,
                        kind,
                    })
                };
                linker::link_module(&module_path, &source, &mut resolve)?
            } else {
                linker::raw_module(&loaded.contents)
            };
            debug!(
                module = %module_path,
                loader = %loaded.loader,
                dependencies = linked.dependencies.len(),
                "linked module"
            );
            // Reverse so the first import is visited first.
            pending.extend(linked.dependencies.into_iter().rev());
            modules.insert(module_path, linked.body);
        }

        let assembled = bootstrap::assemble(&self.registry, &modules, &entry_path);
        let output = transpile::print_bundle(&assembled, self.options.minify)?;
        info!(
            entry = %entry_path,
            modules = modules.len(),
            bytes = output.len(),
            "bundle complete"
        );
        Ok(output)
    }
}

/// Bundles a workspace's files starting from `entry` with the shared engine.
pub async fn bundle(files: VirtualFileMap, entry: &str) -> Result<String, BundleError> {
    let engine = Engine::shared().await?;
    let plugin = VfsPlugin::new(files);
    engine.build(entry, &plugin)
}
