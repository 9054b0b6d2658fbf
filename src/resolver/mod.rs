//! Resolve and load hooks over a [`VirtualFileMap`].
//!
//! The bundling engine asks two questions while walking the module graph:
//! *where does this specifier point* and *what is in that file*. [`VfsPlugin`]
//! answers both from an in-memory file map. Nothing here touches a real
//! filesystem, no symlinks and no `index` lookup: a specifier with an
//! extension must name a map key exactly once it has been joined onto the
//! importer's directory.

use crate::engine::BuildPlugin;
use crate::error::BundleError;
use crate::vfs::{VirtualFileMap, path};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

mod loader;

pub use loader::{LoadedModule, Loader};

/// The syntactic origin of a resolve request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    EntryPoint,
    ImportStatement,
    RequireCall,
    DynamicImport,
    RequireResolve,
    ImportRule,
    UrlToken,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportKind::EntryPoint => "entry-point",
            ImportKind::ImportStatement => "import-statement",
            ImportKind::RequireCall => "require-call",
            ImportKind::DynamicImport => "dynamic-import",
            ImportKind::RequireResolve => "require-resolve",
            ImportKind::ImportRule => "import-rule",
            ImportKind::UrlToken => "url-token",
        };
        f.write_str(name)
    }
}

/// A resolve request as issued by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveArgs<'a> {
    /// The specifier exactly as written in the source.
    pub path: &'a str,
    /// Resolved path of the importing module. Empty for entry points.
    pub importer: &'a str,
    pub kind: ImportKind,
}

impl<'a> ResolveArgs<'a> {
    pub fn entry(path: &'a str) -> Self {
        Self {
            path,
            importer: "",
            kind: ImportKind::EntryPoint,
        }
    }

    pub fn import(path: &'a str, importer: &'a str) -> Self {
        Self {
            path,
            importer,
            kind: ImportKind::ImportStatement,
        }
    }
}

/// Resolve/load hooks bound to one compile request's file map.
///
/// Each compile builds its own plugin, so concurrent compiles never share
/// resolver state. Cloning is cheap; the file map is reference counted.
#[derive(Debug, Clone)]
pub struct VfsPlugin {
    files: Arc<VirtualFileMap>,
}

impl VfsPlugin {
    pub fn new(files: impl Into<Arc<VirtualFileMap>>) -> Self {
        Self {
            files: files.into(),
        }
    }

    pub fn files(&self) -> &VirtualFileMap {
        &self.files
    }

    /// A specifier that names a key exactly, or ends in a script extension,
    /// is used as is. Otherwise the first of `.ts`, `.tsx`, `.js`, `.jsx`
    /// appended to it that exists in the map wins, so `./foo.service` finds
    /// `foo.service.ts`. With no match, a dotted basename stays unchanged and
    /// a bare one gets `.ts`.
    fn complete_extension(&self, joined: String) -> String {
        if self.files.contains(&joined) {
            return joined;
        }
        let extension = path::extension(&joined);
        if extension.is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext)) {
            return joined;
        }
        let completed = SCRIPT_EXTENSIONS
            .iter()
            .map(|ext| format!("{}.{}", joined, ext))
            .find(|candidate| self.files.contains(candidate));
        match (completed, extension) {
            (Some(candidate), _) => candidate,
            (None, Some(_)) => joined,
            (None, None) => format!("{}.{}", joined, SCRIPT_EXTENSIONS[0]),
        }
    }
}

const SCRIPT_EXTENSIONS: [&str; 4] = ["ts", "tsx", "js", "jsx"];

impl BuildPlugin for VfsPlugin {
    fn resolve(&self, args: &ResolveArgs<'_>) -> Result<String, BundleError> {
        match args.kind {
            ImportKind::EntryPoint => Ok(path::normalize(args.path)),
            ImportKind::ImportStatement => {
                let joined = path::join(&path::dirname(args.importer), args.path);
                Ok(self.complete_extension(joined))
            }
            kind => Err(BundleError::NotResolvable {
                path: args.path.to_string(),
                importer: args.importer.to_string(),
                kind,
            }),
        }
    }

    fn load(&self, module_path: &str) -> Result<LoadedModule, BundleError> {
        let contents = self
            .files
            .get(module_path)
            .ok_or_else(|| BundleError::NotLoadable {
                path: module_path.to_string(),
            })?;
        Ok(LoadedModule {
            path: module_path.to_string(),
            contents: contents.to_string(),
            loader: Loader::for_path(module_path),
        })
    }
}
