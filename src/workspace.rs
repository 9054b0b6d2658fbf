//! The top of the pipeline: one workspace in, one deployable artifact out.

use crate::api::{CompileRequest, DeploymentRequest, SourceType};
use crate::engine;
use crate::error::{ArtifactError, CompileError};
use crate::flow::{CreditEstimate, FlowCompiler, FlowGraph};
use crate::manifest::{DeploymentMetadata, extract_manifest};
use crate::vfs::VirtualFileMap;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use tracing::info;

/// Authored content, as handed over by the editor.
#[derive(Debug, Clone)]
pub enum Workspace {
    /// Source files plus the path of the entry module.
    Text { files: VirtualFileMap, entry: String },
    /// One visual flow graph.
    Flow(FlowGraph),
}

impl Workspace {
    pub fn text(files: VirtualFileMap, entry: impl Into<String>) -> Self {
        Workspace::Text {
            files,
            entry: entry.into(),
        }
    }

    pub fn flow_from_json(json: &str) -> Result<Self, CompileError> {
        FlowGraph::from_json(json)
            .map(Workspace::Flow)
            .map_err(|e| CompileError::JsonParseError(e.to_string()))
    }
}

/// The compiled form of a workspace, tagged by workspace type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompiledArtifact {
    Bundle { source: String },
    Flow { document: String },
}

impl CompiledArtifact {
    pub fn source_type(&self) -> SourceType {
        match self {
            CompiledArtifact::Bundle { .. } => SourceType::Js,
            CompiledArtifact::Flow { .. } => SourceType::Flow,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            CompiledArtifact::Bundle { source } => source,
            CompiledArtifact::Flow { document } => document,
        }
    }

    pub fn compile_request(&self) -> CompileRequest {
        CompileRequest {
            source_type: self.source_type(),
            source: self.source().to_string(),
        }
    }

    /// Hex SHA-256 of the source. Identical workspaces hash identically.
    pub fn content_hash(&self) -> String {
        format!("{:x}", Sha256::digest(self.source().as_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledWorkspace {
    pub artifact: CompiledArtifact,
    pub metadata: DeploymentMetadata,
    /// Only present for flow workspaces.
    pub credits: Option<CreditEstimate>,
}

impl CompiledWorkspace {
    pub fn deployment_request(
        &self,
        wasm_bytes: Vec<u8>,
        plugin_version_id: impl Into<String>,
        config: serde_json::Value,
    ) -> DeploymentRequest {
        DeploymentRequest::new(&self.metadata, wasm_bytes, plugin_version_id, config)
    }

    /// Saves the compiled workspace to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|source| ArtifactError::Io {
            path: path.to_string(),
            source,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard()).map_err(|e| ArtifactError::Serialize(e.to_string()))
    }

    /// Loads a compiled workspace from a file.
    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(workspace, _)| workspace)
            .map_err(|e| ArtifactError::Deserialize(e.to_string()))
    }
}

/// Compiles a workspace. Text workspaces are bundled and their manifest
/// read; flow workspaces are validated and serialized.
pub async fn compile_workspace(workspace: Workspace) -> Result<CompiledWorkspace, CompileError> {
    let compiled = match workspace {
        Workspace::Text { files, entry } => {
            let metadata = DeploymentMetadata::from_manifest(extract_manifest(&files).as_ref());
            let source = engine::bundle(files, &entry).await?;
            CompiledWorkspace {
                artifact: CompiledArtifact::Bundle { source },
                metadata,
                credits: None,
            }
        }
        Workspace::Flow(graph) => {
            let compiled = FlowCompiler::builder(graph).build().compile()?;
            let document = compiled
                .spec
                .to_json()
                .map_err(|e| CompileError::SpecSerialization(e.to_string()))?;
            CompiledWorkspace {
                artifact: CompiledArtifact::Flow { document },
                metadata: DeploymentMetadata::default(),
                credits: Some(compiled.credits),
            }
        }
    };
    info!(
        source_type = ?compiled.artifact.source_type(),
        key = %compiled.metadata.key,
        hash = %compiled.artifact.content_hash(),
        "workspace compiled"
    );
    Ok(compiled)
}
