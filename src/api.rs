//! Wire types for the external compile and deployment API.
//!
//! The API itself lives outside this crate; these types only pin down the
//! request and response shapes exchanged with it.

use crate::error::ApiError;
use crate::manifest::DeploymentMetadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of source a compile request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    /// A bundled script.
    Js,
    /// A serialized flow specification.
    Flow,
}

/// `{type: "JS" | "FLOW", source}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileRequest {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileData {
    pub wasm_bytes: Vec<u8>,
}

/// `{success, data: {wasm_bytes}}` or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<CompileData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompileResponse {
    /// The compiled module, or the reason the API gave for not producing one.
    pub fn into_result(self) -> Result<Vec<u8>, ApiError> {
        match self {
            CompileResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data.wasm_bytes),
            CompileResponse { success: true, .. } => Err(ApiError::MissingData),
            CompileResponse { error, .. } => Err(ApiError::Rejected(
                error.unwrap_or_else(|| "no error message".to_string()),
            )),
        }
    }
}

/// Creates or replaces the deployment stored under `key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    pub key: String,
    pub name: String,
    pub description: String,
    pub wasm_bytes: Vec<u8>,
    pub plugin_version_id: String,
    #[serde(default)]
    pub config: Value,
}

impl DeploymentRequest {
    pub fn new(
        metadata: &DeploymentMetadata,
        wasm_bytes: Vec<u8>,
        plugin_version_id: impl Into<String>,
        config: Value,
    ) -> Self {
        Self {
            key: metadata.key.clone(),
            name: metadata.name.clone(),
            description: metadata.description.clone(),
            wasm_bytes,
            plugin_version_id: plugin_version_id.into(),
            config,
        }
    }
}
