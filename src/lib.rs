//! # Kestrel - Workspace Compilation Pipeline for Bot Plugins
//!
//! **Kestrel** turns what a user authors in the browser editor into a single artifact
//! that a sandboxed host can compile and run. A workspace is either a set of text
//! source files (TypeScript, JavaScript, JSX) or one visual flow graph built from
//! nodes and edges.
//!
//! ## Core Workflow
//!
//! 1.  **Collect the files**: Build a [`vfs::VirtualFileMap`] from `(path, content)` pairs. Paths are normalized to absolute form and the map never changes afterwards.
//! 2.  **Bundle**: [`engine::bundle`] resolves imports against the map through the [`resolver::VfsPlugin`] hooks and emits one deterministic script.
//! 3.  **Read the manifest**: [`manifest::extract_manifest`] looks for `manifest.toml`; [`manifest::DeploymentMetadata`] applies the defaults.
//! 4.  **Or compile a graph**: [`flow::FlowCompiler`] validates a [`flow::FlowGraph`] and emits a [`flow::FlowSpec`], reporting every violation at once when the graph is invalid.
//! 5.  **Run**: Inside the host, the compiled plugin registers its handlers on a [`guest::GuestRuntime`], which dispatches host events to them.
//!
//! [`workspace::compile_workspace`] runs steps 1 to 4 for either kind of workspace.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kestrel::prelude::*;
//!
//! # async fn run_example() -> Result<()> {
//! let files: VirtualFileMap = [
//!     ("index.ts", "import { greet } from './greet'; greet('world');"),
//!     ("greet.ts", "export const greet = (name: string) => console.log(`hi ${name}`);"),
//!     ("manifest.toml", "[deployment]\nkey = \"greeter@guild\"\n"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let compiled = compile_workspace(Workspace::text(files, "index.ts")).await?;
//! println!("{} -> {}", compiled.metadata.key, compiled.artifact.content_hash());
//!
//! let graph = FlowGraph::from_json(&std::fs::read_to_string("graph.json")?)?;
//! match FlowCompiler::builder(graph).build().compile() {
//!     Ok(flow) => println!("{}", flow.spec.to_json()?),
//!     Err(e) => {
//!         for violation in &e.violations {
//!             eprintln!("{}", violation);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Guest Side
//!
//! ```rust
//! use kestrel::guest::{GuestRuntime, HostEvent, RecordingHost};
//!
//! let mut guest = GuestRuntime::new(RecordingHost::new());
//! guest.on("A", |_| Ok(()));
//! guest.on("A", |_| Ok(()));
//! assert_eq!(guest.describe().events, vec!["A".to_string()]);
//!
//! let result = guest.handle_json(br#"{"type":"A","data":null}"#);
//! assert!(result.success);
//! ```

pub mod api;
pub mod engine;
pub mod error;
pub mod flow;
pub mod guest;
pub mod manifest;
pub mod prelude;
pub mod resolver;
pub mod vfs;
pub mod workspace;
