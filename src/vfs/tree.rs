use serde::Serialize;
use std::collections::BTreeMap;

/// A directory hierarchy derived from flat workspace paths.
///
/// This is only a view for file browsers. Bundling always works on the flat
/// [`VirtualFileMap`](super::VirtualFileMap).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileTree {
    pub entries: Vec<TreeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeEntry {
    Directory {
        name: String,
        path: String,
        children: Vec<TreeEntry>,
    },
    File {
        name: String,
        path: String,
    },
}

impl TreeEntry {
    pub fn name(&self) -> &str {
        match self {
            TreeEntry::Directory { name, .. } | TreeEntry::File { name, .. } => name,
        }
    }
}

#[derive(Default)]
struct DirBuilder {
    dirs: BTreeMap<String, DirBuilder>,
    files: BTreeMap<String, String>,
}

impl DirBuilder {
    fn insert(&mut self, segments: &[&str], full_path: &str) {
        match segments {
            [] => {}
            [file] => {
                self.files.insert(file.to_string(), full_path.to_string());
            }
            [dir, rest @ ..] => self
                .dirs
                .entry(dir.to_string())
                .or_default()
                .insert(rest, full_path),
        }
    }

    fn build(self, prefix: &str) -> Vec<TreeEntry> {
        let mut entries = Vec::with_capacity(self.dirs.len() + self.files.len());
        for (name, dir) in self.dirs {
            let path = format!("{}/{}", prefix, name);
            entries.push(TreeEntry::Directory {
                children: dir.build(&path),
                name,
                path,
            });
        }
        for (name, path) in self.files {
            entries.push(TreeEntry::File { name, path });
        }
        entries
    }
}

impl FileTree {
    /// Builds the tree. Directories come before files, both sorted by name.
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut root = DirBuilder::default();
        for path in paths {
            let normalized = super::path::normalize(path);
            let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
            root.insert(&segments, &normalized);
        }
        Self {
            entries: root.build(""),
        }
    }
}
