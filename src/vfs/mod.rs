use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub mod path;
mod tree;

pub use tree::{FileTree, TreeEntry};

/// One authored source file as the editor sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// An immutable map from normalized absolute path to source text.
///
/// Built once per compile request. Keys are normalized with [`path::normalize`]
/// so `index.ts`, `/index.ts` and `./index.ts` all name the same file. When
/// two files normalize to the same key, the later one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualFileMap {
    files: BTreeMap<String, String>,
}

impl VirtualFileMap {
    pub fn new(files: impl IntoIterator<Item = SourceFile>) -> Self {
        let mut map = BTreeMap::new();
        for file in files {
            let key = path::normalize(&file.path);
            if map.insert(key.clone(), file.content).is_some() {
                debug!(path = %key, "duplicate workspace path, keeping the later file");
            }
        }
        Self { files: map }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Looks a path up after normalizing it.
    pub fn lookup(&self, path: &str) -> Option<&str> {
        self.get(&path::normalize(path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn tree(&self) -> FileTree {
        FileTree::from_paths(self.paths())
    }
}

impl FromIterator<SourceFile> for VirtualFileMap {
    fn from_iter<T: IntoIterator<Item = SourceFile>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for VirtualFileMap {
    fn from_iter<T: IntoIterator<Item = (P, C)>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(|(p, c)| SourceFile::new(p, c)))
    }
}
