//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and functions from the kestrel crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use kestrel::prelude::*;
//!
//! # async fn run_example() -> Result<()> {
//! let files: VirtualFileMap = [("index.ts", "export const x = 1;")].into_iter().collect();
//! let bundle = bundle(files.clone(), "index.ts").await?;
//! let metadata = DeploymentMetadata::from_manifest(extract_manifest(&files).as_ref());
//! println!("{}: {} bytes", metadata.key, bundle.len());
//! # Ok(())
//! # }
//! ```

// Pipeline entry points
pub use crate::engine::{Engine, EngineOptions, bundle};
pub use crate::manifest::{DeploymentMetadata, Manifest, extract_manifest};
pub use crate::workspace::{CompiledArtifact, CompiledWorkspace, Workspace, compile_workspace};

// Files and resolution
pub use crate::resolver::{ImportKind, Loader, VfsPlugin};
pub use crate::vfs::{SourceFile, VirtualFileMap};

// Flow graphs
pub use crate::flow::{CompiledFlow, EdgeKind, FlowCompiler, FlowGraph, FlowSpec, NodeType};

// Guest runtime
pub use crate::guest::{GuestRuntime, HandleResult, Host, HostCall, HostEvent};

// Error types
pub use crate::error::{BundleError, CompileError, GraphValidationError, GraphViolation};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
