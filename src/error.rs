use crate::resolver::ImportKind;
use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while bundling a text workspace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BundleError {
    #[error("Could not resolve '{path}' imported from '{importer}' as {kind}")]
    NotResolvable {
        path: String,
        importer: String,
        kind: ImportKind,
    },

    #[error("Could not load '{path}': no such file in the workspace")]
    NotLoadable { path: String },

    #[error("Syntax error in '{path}': {}", .messages.join("; "))]
    EngineSyntax { path: String, messages: Vec<String> },
}

impl BundleError {
    /// `true` for violations of the resolve/load hook contract, `false` for
    /// diagnostics produced by the engine itself.
    pub fn is_resolver_error(&self) -> bool {
        matches!(
            self,
            BundleError::NotResolvable { .. } | BundleError::NotLoadable { .. }
        )
    }
}

/// Raised internally when `manifest.toml` cannot be parsed. It never reaches
/// callers of `extract_manifest`.
#[derive(Error, Debug, Clone)]
pub enum ManifestError {
    #[error("Failed to parse manifest.toml: {0}")]
    Parse(String),
}

/// A single rule violation found while validating a flow graph.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphViolation {
    #[error("Duplicate node id '{node_id}'")]
    DuplicateNode { node_id: String },

    #[error("Edge '{edge_id}' references unknown node '{missing_node_id}'")]
    DanglingEdge {
        edge_id: String,
        missing_node_id: String,
    },

    #[error("Edge '{edge_id}' from '{source_node_id}' to '{target_node_id}' closes a cycle")]
    CyclicGraph {
        edge_id: String,
        source_node_id: String,
        target_node_id: String,
    },

    #[error("Node '{node_id}' is not reachable from any entry node")]
    UnreachableNode { node_id: String },

    #[error("Node '{node_id}' is reachable from more than one entry node: {}", .entry_ids.join(", "))]
    SharedNode {
        node_id: String,
        entry_ids: Vec<String>,
    },

    #[error("Option node '{node_id}' has an invalid binding: {reason}")]
    InvalidOptionBinding { node_id: String, reason: String },

    #[error("Node '{node_id}' cannot be a condition branch of '{parent_id}': {reason}")]
    InvalidConditionChild {
        node_id: String,
        parent_id: String,
        reason: String,
    },

    #[error("Condition '{node_id}' has {count} else branches, at most one is allowed")]
    MultipleElseBranches { node_id: String, count: usize },

    #[error("{path}: {message}")]
    InvalidData {
        node_id: String,
        path: String,
        message: String,
    },
}

impl GraphViolation {
    /// The node an editor should highlight for this violation, if any.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            GraphViolation::DuplicateNode { node_id }
            | GraphViolation::UnreachableNode { node_id }
            | GraphViolation::SharedNode { node_id, .. }
            | GraphViolation::InvalidOptionBinding { node_id, .. }
            | GraphViolation::InvalidConditionChild { node_id, .. }
            | GraphViolation::MultipleElseBranches { node_id, .. }
            | GraphViolation::InvalidData { node_id, .. } => Some(node_id),
            GraphViolation::DanglingEdge { .. } | GraphViolation::CyclicGraph { .. } => None,
        }
    }

    /// The edge an editor should highlight for this violation, if any.
    pub fn edge_id(&self) -> Option<&str> {
        match self {
            GraphViolation::DanglingEdge { edge_id, .. }
            | GraphViolation::CyclicGraph { edge_id, .. } => Some(edge_id),
            _ => None,
        }
    }
}

/// Every violation found in one validation pass over a flow graph.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Flow graph is invalid ({} violation(s)):\n  {}", .violations.len(), .violations.iter().join("\n  "))]
pub struct GraphValidationError {
    pub violations: Vec<GraphViolation>,
}

impl GraphValidationError {
    pub fn new(violations: Vec<GraphViolation>) -> Self {
        Self { violations }
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Ids of every node named by a violation, in report order, without repeats.
    pub fn offending_nodes(&self) -> Vec<&str> {
        self.violations
            .iter()
            .filter_map(GraphViolation::node_id)
            .unique()
            .collect()
    }
}

/// An error raised by a guest event handler.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Handler for '{event_type}' failed: {source}")]
    Failed {
        event_type: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Handler for '{event_type}' panicked: {message}")]
    Panicked { event_type: String, message: String },

    #[error("Malformed host event: {0}")]
    MalformedEvent(String),
}

/// Errors that can occur while persisting or restoring compiled artifacts.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Artifact serialization failed: {0}")]
    Serialize(String),

    #[error("Artifact deserialization failed: {0}")]
    Deserialize(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort a workspace compile.
#[derive(Error, Debug, Clone)]
pub enum CompileError {
    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Graph(#[from] GraphValidationError),

    #[error("Failed to parse flow graph JSON: {0}")]
    JsonParseError(String),

    #[error("Failed to serialize flow specification: {0}")]
    SpecSerialization(String),
}

/// Errors reported by the external compile API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Compile request rejected: {0}")]
    Rejected(String),

    #[error("Compile response reported success but carried no module")]
    MissingData,
}
