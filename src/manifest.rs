//! Deployment metadata from a workspace's `manifest.toml`.
//!
//! ```toml
//! [deployment]
//! key = "welcome-bot@guild"
//! name = "Welcome Bot"
//! description = "Greets new members"
//!
//! [module]
//! type = "js"
//! ```
//!
//! Every field is optional and unknown keys are ignored. A missing or broken
//! manifest is never an error; the deployment just falls back to defaults.

use crate::error::ManifestError;
use crate::vfs::VirtualFileMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The well-known location of the manifest inside a workspace.
pub const MANIFEST_PATH: &str = "manifest.toml";

pub const DEFAULT_DEPLOYMENT_KEY: &str = "default@web";
pub const DEFAULT_DEPLOYMENT_NAME: &str = "Untitled Plugin";
pub const DEFAULT_DEPLOYMENT_DESCRIPTION: &str = "No description";
pub const DEFAULT_MODULE_TYPE: &str = "js";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub deployment: Option<DeploymentSection>,
    #[serde(default)]
    pub module: Option<ModuleSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSection {
    pub key: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSection {
    #[serde(rename = "type")]
    pub module_type: Option<String>,
}

impl Manifest {
    /// Parses manifest text. Used by [`extract_manifest`], which swallows the error.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        toml::from_str(text).map_err(|e| ManifestError::Parse(e.to_string()))
    }
}

/// Finds and parses `manifest.toml`. Returns `None` when the file is absent
/// or cannot be parsed; the parse failure is logged, never raised.
pub fn extract_manifest(files: &VirtualFileMap) -> Option<Manifest> {
    let text = files.lookup(MANIFEST_PATH)?;
    match Manifest::parse(text) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            warn!(error = %e, "ignoring unparsable manifest");
            None
        }
    }
}

/// Deployment metadata with every default applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentMetadata {
    pub key: String,
    pub name: String,
    pub description: String,
    pub module_type: String,
}

impl Default for DeploymentMetadata {
    fn default() -> Self {
        Self::from_manifest(None)
    }
}

impl DeploymentMetadata {
    pub fn from_manifest(manifest: Option<&Manifest>) -> Self {
        let deployment = manifest.and_then(|m| m.deployment.as_ref());
        let module = manifest.and_then(|m| m.module.as_ref());
        let field = |value: Option<&String>, default: &str| {
            value.cloned().unwrap_or_else(|| default.to_string())
        };
        Self {
            key: field(deployment.and_then(|d| d.key.as_ref()), DEFAULT_DEPLOYMENT_KEY),
            name: field(deployment.and_then(|d| d.name.as_ref()), DEFAULT_DEPLOYMENT_NAME),
            description: field(
                deployment.and_then(|d| d.description.as_ref()),
                DEFAULT_DEPLOYMENT_DESCRIPTION,
            ),
            module_type: field(module.and_then(|m| m.module_type.as_ref()), DEFAULT_MODULE_TYPE),
        }
    }
}
