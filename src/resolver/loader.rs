use crate::vfs::path;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The source language a module is parsed as, chosen purely from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    Ts,
    Tsx,
    Js,
    Jsx,
    /// Anything else. The content is exposed verbatim as the module's default export.
    Default,
}

impl Loader {
    pub fn for_path(file_path: &str) -> Self {
        match path::extension(file_path) {
            Some("ts") => Loader::Ts,
            Some("tsx") => Loader::Tsx,
            Some("js") => Loader::Js,
            Some("jsx") => Loader::Jsx,
            _ => Loader::Default,
        }
    }

    pub fn is_typescript(self) -> bool {
        matches!(self, Loader::Ts | Loader::Tsx)
    }

    pub fn is_jsx(self) -> bool {
        matches!(self, Loader::Tsx | Loader::Jsx)
    }

    /// Whether the engine parses this module as source code.
    pub fn is_script(self) -> bool {
        !matches!(self, Loader::Default)
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Loader::Ts => "ts",
            Loader::Tsx => "tsx",
            Loader::Js => "js",
            Loader::Jsx => "jsx",
            Loader::Default => "default",
        };
        f.write_str(name)
    }
}

/// The result of a successful load: raw content plus the loader to parse it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    pub path: String,
    pub contents: String,
    pub loader: Loader,
}
